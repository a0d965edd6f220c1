//! Toolpath segments
//!
//! The hand-off format between planner, arc fitter, emitter and preview:
//! a flat list of tagged motion primitives.

use serde::{Deserialize, Serialize};

use crate::geometry::PointXYZ;

/// An ordered point sequence for one lateral sweep of the cutter.
pub type Pass = Vec<PointXYZ>;

/// Arc data carried by an arc segment.
///
/// `cw` is stored in the clockwise convention (true selects G2), which is
/// the inverse sense of the profile `Segment`'s `anticlockwise` flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcExtras {
    pub cw: bool,
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

/// Motion kind. Only arcs carry extra data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Motion {
    Rapid,
    Plunge,
    Cut,
    Retract,
    Arc(ArcExtras),
}

impl Motion {
    pub fn name(&self) -> &'static str {
        match self {
            Motion::Rapid => "rapid",
            Motion::Plunge => "plunge",
            Motion::Cut => "cut",
            Motion::Retract => "retract",
            Motion::Arc(_) => "arc",
        }
    }
}

/// One motion primitive. For arcs `pts` is exactly `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolpathSegment {
    #[serde(flatten)]
    pub motion: Motion,
    pub pts: Vec<PointXYZ>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<f64>,
}

impl ToolpathSegment {
    pub fn rapid(to: PointXYZ) -> Self {
        Self {
            motion: Motion::Rapid,
            pts: vec![to],
            feed: None,
        }
    }

    pub fn plunge(to: PointXYZ, feed: Option<f64>) -> Self {
        Self {
            motion: Motion::Plunge,
            pts: vec![to],
            feed,
        }
    }

    pub fn retract(to: PointXYZ, feed: Option<f64>) -> Self {
        Self {
            motion: Motion::Retract,
            pts: vec![to],
            feed,
        }
    }

    /// A cutting polyline; consecutive duplicate points are dropped.
    pub fn cut(pts: Vec<PointXYZ>, feed: Option<f64>) -> Self {
        Self {
            motion: Motion::Cut,
            pts: dedup_consecutive(pts),
            feed,
        }
    }

    pub fn arc(start: PointXYZ, end: PointXYZ, arc: ArcExtras, feed: Option<f64>) -> Self {
        Self {
            motion: Motion::Arc(arc),
            pts: vec![start, end],
            feed,
        }
    }

    pub fn is_cut(&self) -> bool {
        matches!(self.motion, Motion::Cut)
    }

    pub fn is_retract(&self) -> bool {
        matches!(self.motion, Motion::Retract)
    }

    pub fn arc_extras(&self) -> Option<&ArcExtras> {
        match &self.motion {
            Motion::Arc(a) => Some(a),
            _ => None,
        }
    }

    pub fn start(&self) -> Option<PointXYZ> {
        self.pts.first().copied()
    }

    pub fn end(&self) -> Option<PointXYZ> {
        self.pts.last().copied()
    }
}

/// Drop consecutive points that are exactly equal.
pub fn dedup_consecutive(mut pts: Vec<PointXYZ>) -> Vec<PointXYZ> {
    pts.dedup();
    pts
}

/// Split a segment list into passes. Each pass ends with a retract; any
/// trailing segments without one form a final partial pass.
pub fn split_into_passes(segments: &[ToolpathSegment]) -> Vec<&[ToolpathSegment]> {
    let mut passes = Vec::new();
    let mut start = 0;
    for (i, seg) in segments.iter().enumerate() {
        if seg.is_retract() {
            passes.push(&segments[start..=i]);
            start = i + 1;
        }
    }
    if start < segments.len() {
        passes.push(&segments[start..]);
    }
    passes
}
