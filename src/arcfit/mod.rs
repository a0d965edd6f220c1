//! Arc fitter
//!
//! Collapses runs of cut points that lie on a circle (within `tol`) into
//! single arc segments. The last `1 - arc_frac` of every cut is always
//! re-emitted as straight micro-cuts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ToolpathError};
use crate::fitting::{fit_circle, Circle};
use crate::geometry::PointXYZ;
use crate::toolpath::{ArcExtras, ToolpathSegment};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcFitConfig {
    /// Max point-to-circle distance for points merged into an arc (mm).
    pub tol: f64,
    /// Minimum points an arc must span.
    pub min_pts: usize,
    /// Leading fraction of each cut eligible for fitting.
    pub arc_frac: f64,
}

impl Default for ArcFitConfig {
    fn default() -> Self {
        Self {
            tol: 0.002,
            min_pts: 6,
            arc_frac: 0.8,
        }
    }
}

impl ArcFitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    pub fn arc_frac(mut self, arc_frac: f64) -> Self {
        self.arc_frac = arc_frac;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ToolpathError::invalid_parameter("tol", self.tol));
        }
        if self.min_pts < 3 {
            return Err(ToolpathError::invalid_parameter("min_pts", self.min_pts));
        }
        if !(0.0..=1.0).contains(&self.arc_frac) {
            return Err(ToolpathError::invalid_parameter("arc_frac", self.arc_frac));
        }
        Ok(())
    }
}

/// Replace circular runs inside cut segments with arc segments.
///
/// Rapid, plunge and retract segments, existing arcs, and cuts shorter than
/// `min_pts` are passed through untouched. A fitted cut becomes a sequence of
/// arcs and two-point cuts that together trace the same path; every new
/// segment inherits the original feed.
pub fn fit_arcs_in_segments(segments: &[ToolpathSegment], config: &ArcFitConfig) -> Result<Vec<ToolpathSegment>> {
    config.validate()?;

    let mut out = Vec::with_capacity(segments.len());
    let mut arcs = 0usize;
    let mut merged = 0usize;

    for seg in segments {
        if !seg.is_cut() || seg.pts.len() < config.min_pts {
            out.push(seg.clone());
            continue;
        }
        let (a, m) = fit_cut(&seg.pts, seg.feed, config, &mut out);
        arcs += a;
        merged += m;
    }

    debug!(arcs, merged_points = merged, segments = out.len(), "fitted arcs");
    Ok(out)
}

/// Returns (arcs emitted, points merged into arcs).
fn fit_cut(pts: &[PointXYZ], feed: Option<f64>, config: &ArcFitConfig, out: &mut Vec<ToolpathSegment>) -> (usize, usize) {
    let n = pts.len();
    let n_fit = ((n - 1) as f64 * config.arc_frac).floor() as usize;
    let mut arcs = 0;
    let mut merged = 0;
    let mut i = 0;

    while i + (config.min_pts - 1) < n_fit {
        let mut best: Option<Circle> = None;
        let mut j = i + 2;

        while j <= n_fit {
            let window = &pts[i..=j];
            match fit_circle(window) {
                Some(c) if c.max_residual(window) <= config.tol => {
                    best = Some(c);
                    j += 1;
                }
                _ => break,
            }
        }

        match best {
            // pts[i..j] is the last window that fit
            Some(c) if j - i >= config.min_pts => {
                out.push(arc_segment(pts[i], pts[j - 1], &c, feed));
                arcs += 1;
                merged += j - i;
                i = j - 1;
            }
            _ => {
                out.push(ToolpathSegment::cut(vec![pts[i], pts[i + 1]], feed));
                i += 1;
            }
        }
    }

    for w in pts[i..].windows(2) {
        out.push(ToolpathSegment::cut(vec![w[0], w[1]], feed));
    }

    (arcs, merged)
}

fn arc_segment(start: PointXYZ, end: PointXYZ, circle: &Circle, feed: Option<f64>) -> ToolpathSegment {
    let (sx, sy) = (start.x - circle.cx, start.y - circle.cy);
    let (ex, ey) = (end.x - circle.cx, end.y - circle.cy);
    let cross = sx * ey - sy * ex;

    ToolpathSegment::arc(
        start,
        end,
        ArcExtras {
            cw: cross < 0.0,
            cx: circle.cx,
            cy: circle.cy,
            r: circle.r,
        },
        feed,
    )
}
