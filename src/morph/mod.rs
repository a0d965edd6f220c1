//! Line morpher
//!
//! Interpolates passes between two boundary lines so that no two adjacent
//! passes are further apart laterally (in Y) than the step-over, at any
//! sample index.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ToolpathError};
use crate::geometry::{densify, normalize_right_to_left, PointXYZ, Resample};
use crate::toolpath::Pass;

/// Morpher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphConfig {
    /// Maximum lateral step between adjacent passes (mm).
    pub step_over: f64,
    /// Slack added to `step_over` when checking gaps.
    pub eps: f64,
    /// Hard cap on adaptive-insert iterations.
    pub max_iter: usize,
    /// Densify chord length; falls back to `step_over` when unset.
    pub max_seg: Option<f64>,
    #[serde(default)]
    pub resample: Resample,
}

impl MorphConfig {
    pub fn new(step_over: f64) -> Self {
        Self {
            step_over,
            eps: 1e-6,
            max_iter: 1000,
            max_seg: None,
            resample: Resample::XAligned,
        }
    }

    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn max_seg(mut self, max_seg: f64) -> Self {
        self.max_seg = Some(max_seg);
        self
    }

    pub fn resample(mut self, resample: Resample) -> Self {
        self.resample = resample;
        self
    }

    fn chord(&self) -> f64 {
        self.max_seg.unwrap_or(self.step_over)
    }
}

/// Largest index-wise |dy| between two passes.
pub fn max_lateral_gap(p: &[PointXYZ], q: &[PointXYZ]) -> f64 {
    p.iter()
        .zip(q)
        .map(|(a, b)| (b.y - a.y).abs())
        .fold(0.0, f64::max)
}

/// Build the pass list `[A, ..., B]` between two boundary lines.
///
/// The first and last returned passes are the boundary lines after
/// resampling, direction normalization and densifying.
pub fn morph_lines_adaptive(line_a: &[PointXYZ], line_b: &[PointXYZ], config: &MorphConfig) -> Result<Vec<Pass>> {
    if config.step_over.is_nan() || config.step_over <= 0.0 {
        return Err(ToolpathError::InvalidStepOver(config.step_over));
    }
    if !(config.eps.is_finite() && config.eps >= 0.0) {
        return Err(ToolpathError::invalid_parameter("eps", config.eps));
    }
    if line_a.len() < 2 {
        return Err(ToolpathError::too_few_points("line A", line_a.len()));
    }
    if line_b.len() < 2 {
        return Err(ToolpathError::too_few_points("line B", line_b.len()));
    }

    let (a, b) = config.resample.equalize(
        normalize_right_to_left(line_a.to_vec()),
        normalize_right_to_left(line_b.to_vec()),
    )?;

    let chord = config.chord();
    let a = normalize_right_to_left(densify(&a, chord)?);
    let b = normalize_right_to_left(densify(&b, chord)?);

    // densify works per line, so counts can drift apart again
    let (a, b) = config.resample.equalize(a, b)?;

    let step = config.step_over;
    let limit = step + config.eps;
    let mut passes: Vec<Pass> = vec![a, b];
    let mut idx = 0;
    let mut iter = 0;

    while idx + 1 < passes.len() {
        iter += 1;
        if iter > config.max_iter {
            return Err(ToolpathError::MaxIterationsExceeded {
                max_iter: config.max_iter,
            });
        }

        let gap = max_lateral_gap(&passes[idx], &passes[idx + 1]);
        if gap <= limit {
            idx += 1;
            continue;
        }

        let need = (gap / step).ceil() as usize - 1;
        let inv = 1.0 / (need + 1) as f64;
        let inserted: Vec<Pass> = {
            let (p, q) = (&passes[idx], &passes[idx + 1]);
            (1..=need)
                .map(|j| {
                    let t = j as f64 * inv;
                    p.iter().zip(q).map(|(pa, qa)| pa.lerp(qa, t)).collect()
                })
                .collect()
        };
        passes.splice(idx + 1..idx + 1, inserted);
    }

    debug!(
        passes = passes.len(),
        points_per_pass = passes[0].len(),
        iterations = iter,
        "morphed boundary lines"
    );

    Ok(passes)
}
