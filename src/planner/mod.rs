//! Segment planner
//!
//! Turns a list of passes into rapid -> plunge -> cut -> retract segments.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ToolpathError};
use crate::geometry::PointXYZ;
use crate::toolpath::{Pass, ToolpathSegment};

/// How cut feed is chosen along a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum FeedPolicy {
    /// Every cut runs at `base_feed`.
    #[default]
    Uniform,
    /// Each micro-segment runs at `base_feed * clamp(dy / step_over, min_fraction, 1)`,
    /// where `dy` is the local lateral step from the previous pass.
    #[serde(rename_all = "camelCase")]
    LocalScaled { min_fraction: f64 },
}

/// Planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Clearance plane position in Y.
    pub safe_y: f64,
    /// Fixed cutting depth; when unset each point keeps its own Z.
    pub cut_z: Option<f64>,
    /// Step-over the passes were built with.
    pub step_over: f64,
    /// Full-width cutting feed (mm/min).
    pub base_feed: f64,
    /// Plunge/retract feed; defaults to 40% of `base_feed`.
    pub plunge_feed: Option<f64>,
    #[serde(default)]
    pub feed_policy: FeedPolicy,
}

impl PlannerConfig {
    pub fn new(safe_y: f64, step_over: f64, base_feed: f64) -> Self {
        Self {
            safe_y,
            cut_z: None,
            step_over,
            base_feed,
            plunge_feed: None,
            feed_policy: FeedPolicy::Uniform,
        }
    }

    pub fn cut_z(mut self, z: f64) -> Self {
        self.cut_z = Some(z);
        self
    }

    pub fn plunge_feed(mut self, feed: f64) -> Self {
        self.plunge_feed = Some(feed);
        self
    }

    pub fn feed_policy(mut self, policy: FeedPolicy) -> Self {
        self.feed_policy = policy;
        self
    }

    pub fn effective_plunge_feed(&self) -> f64 {
        self.plunge_feed.unwrap_or(self.base_feed * 0.4)
    }

    fn validate(&self) -> Result<()> {
        if self.step_over.is_nan() || self.step_over <= 0.0 {
            return Err(ToolpathError::InvalidStepOver(self.step_over));
        }
        if !(self.base_feed.is_finite() && self.base_feed > 0.0) {
            return Err(ToolpathError::invalid_parameter("base_feed", self.base_feed));
        }
        if let FeedPolicy::LocalScaled { min_fraction } = self.feed_policy {
            if !(min_fraction > 0.0 && min_fraction <= 1.0) {
                return Err(ToolpathError::invalid_parameter("min_fraction", min_fraction));
            }
        }
        Ok(())
    }
}

/// Plan motion segments for every non-empty pass, in order.
pub fn plan_segments_from_passes(passes: &[Pass], config: &PlannerConfig) -> Result<Vec<ToolpathSegment>> {
    config.validate()?;

    let plunge_feed = Some(config.effective_plunge_feed());
    let mut segments = Vec::with_capacity(passes.len() * 4);
    let mut previous: Option<&Pass> = None;

    for pass in passes {
        let (first, last) = match (pass.first(), pass.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => continue,
        };

        segments.push(ToolpathSegment::rapid(first.with_y(config.safe_y)));
        segments.push(ToolpathSegment::plunge(
            first.with_z(config.cut_z.unwrap_or(first.z)),
            plunge_feed,
        ));

        let cut_pts: Vec<PointXYZ> = match config.cut_z {
            Some(z) => pass.iter().map(|p| p.with_z(z)).collect(),
            None => pass.clone(),
        };

        match config.feed_policy {
            FeedPolicy::Uniform => {
                segments.push(ToolpathSegment::cut(cut_pts, Some(config.base_feed)));
            }
            FeedPolicy::LocalScaled { min_fraction } => {
                let dy = local_steps(pass, previous, config.step_over);
                segments.extend(scaled_cuts(&cut_pts, &dy, config, min_fraction));
            }
        }

        segments.push(ToolpathSegment::retract(last.with_y(config.safe_y), plunge_feed));
        previous = Some(pass);
    }

    debug!(passes = passes.len(), segments = segments.len(), "planned segments");
    Ok(segments)
}

/// Lateral step at each point relative to the previous pass. Without a
/// comparable previous pass the nominal step-over is assumed.
fn local_steps(pass: &Pass, previous: Option<&Pass>, step_over: f64) -> Vec<f64> {
    match previous {
        Some(prev) if prev.len() == pass.len() => pass
            .iter()
            .zip(prev)
            .map(|(p, q)| (p.y - q.y).abs())
            .collect(),
        _ => vec![step_over; pass.len()],
    }
}

/// Split a pass into cut runs sharing one feed each.
fn scaled_cuts(pts: &[PointXYZ], dy: &[f64], config: &PlannerConfig, min_fraction: f64) -> Vec<ToolpathSegment> {
    if pts.len() < 2 {
        return vec![ToolpathSegment::cut(pts.to_vec(), Some(config.base_feed))];
    }

    let feed_at = |i: usize| {
        let local = 0.5 * (dy[i] + dy[i + 1]);
        let frac = (local / config.step_over).clamp(min_fraction, 1.0);
        round_feed(config.base_feed * frac)
    };

    let mut cuts = Vec::new();
    let mut run = vec![pts[0]];
    let mut run_feed = feed_at(0);

    for i in 0..pts.len() - 1 {
        let f = feed_at(i);
        if f != run_feed {
            let end = run[run.len() - 1];
            cuts.push(ToolpathSegment::cut(std::mem::replace(&mut run, vec![end]), Some(run_feed)));
            run_feed = f;
        }
        run.push(pts[i + 1]);
    }
    cuts.push(ToolpathSegment::cut(run, Some(run_feed)));
    cuts
}

fn round_feed(f: f64) -> f64 {
    (f * 1000.0).round() / 1000.0
}
