//! Preview tessellation
//!
//! Flattens a segment list into a point sequence a renderer can draw as a
//! polyline, tagging each point with the motion that produced it.

use cgmath::{Deg, Matrix3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::PointXYZ;
use crate::post::{RotationMode, RotationPlan};
use crate::toolpath::{ArcExtras, Motion, ToolpathSegment};

/// Hard cap on chords per arc.
pub const MAX_ARC_SUBDIVISIONS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessellationConfig {
    /// Max chord height (sagitta) when splitting arcs (mm).
    pub arc_res: f64,
    pub max_subdivisions: usize,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            arc_res: 0.2,
            max_subdivisions: MAX_ARC_SUBDIVISIONS,
        }
    }
}

impl TessellationConfig {
    pub fn arc_res(mut self, arc_res: f64) -> Self {
        self.arc_res = arc_res;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewPoint {
    pub position: PointXYZ,
    pub is_cut: bool,
    pub is_rapid: bool,
    pub is_retract: bool,
    pub is_arc: bool,
}

impl PreviewPoint {
    fn new(position: PointXYZ, motion: &Motion) -> Self {
        Self {
            position,
            is_cut: matches!(motion, Motion::Cut | Motion::Plunge | Motion::Arc(_)),
            is_rapid: matches!(motion, Motion::Rapid),
            is_retract: matches!(motion, Motion::Retract),
            is_arc: matches!(motion, Motion::Arc(_)),
        }
    }
}

/// Flatten segments into preview points; arcs are split into chords.
/// Consecutive points at the same position are emitted once.
pub fn tessellate_segments(segments: &[ToolpathSegment], config: &TessellationConfig) -> Vec<PreviewPoint> {
    let mut out: Vec<PreviewPoint> = Vec::new();
    let mut push = |p: PointXYZ, motion: &Motion| {
        if out.last().map(|last| last.position) != Some(p) {
            out.push(PreviewPoint::new(p, motion));
        }
    };

    for seg in segments {
        match &seg.motion {
            Motion::Arc(arc) if seg.pts.len() == 2 => {
                push(seg.pts[0], &seg.motion);
                for p in arc_points(&seg.pts[0], &seg.pts[1], arc, config.arc_res, config.max_subdivisions) {
                    push(p, &seg.motion);
                }
            }
            _ => {
                for p in &seg.pts {
                    push(*p, &seg.motion);
                }
            }
        }
    }
    out
}

/// Points along an arc after `start`, ending exactly on `end`. Z is
/// interpolated linearly over the sweep.
pub fn tessellate_arc(start: &PointXYZ, end: &PointXYZ, arc: &ArcExtras, arc_res: f64) -> Vec<PointXYZ> {
    arc_points(start, end, arc, arc_res, MAX_ARC_SUBDIVISIONS)
}

fn arc_points(start: &PointXYZ, end: &PointXYZ, arc: &ArcExtras, arc_res: f64, max_subdivisions: usize) -> Vec<PointXYZ> {
    let a0 = (start.y - arc.cy).atan2(start.x - arc.cx);
    let a1 = (end.y - arc.cy).atan2(end.x - arc.cx);
    let sweep = arc_sweep(a0, a1, arc.cw);

    let ratio = (1.0 - arc_res / arc.r).clamp(-1.0, 1.0);
    let max_step = 2.0 * ratio.acos();
    let n = if max_step > 0.0 {
        (sweep.abs() / max_step).ceil() as usize
    } else {
        max_subdivisions
    };
    let n = n.clamp(1, max_subdivisions.max(1));

    let mut pts: Vec<PointXYZ> = (1..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let a = a0 + sweep * t;
            PointXYZ::new(
                arc.cx + arc.r * a.cos(),
                arc.cy + arc.r * a.sin(),
                start.z + (end.z - start.z) * t,
            )
        })
        .collect();
    pts.push(*end);
    pts
}

/// Signed sweep from `a0` to `a1`: negative when clockwise.
fn arc_sweep(a0: f64, a1: f64, cw: bool) -> f64 {
    use std::f64::consts::TAU;

    let ccw = (a1 - a0).rem_euclid(TAU);
    if cw {
        if ccw == 0.0 {
            0.0
        } else {
            ccw - TAU
        }
    } else {
        ccw
    }
}

fn rotate_about_x(points: &[PreviewPoint], angle_deg: f64) -> Vec<PreviewPoint> {
    let m = Matrix3::from_angle_x(Deg(angle_deg));
    points
        .iter()
        .map(|p| PreviewPoint {
            position: PointXYZ::from_vec(m * p.position.to_vec()),
            ..*p
        })
        .collect()
}

/// Split preview points into passes, each ending on a retract point.
fn preview_passes(points: &[PreviewPoint]) -> Vec<&[PreviewPoint]> {
    let mut passes = Vec::new();
    let mut start = 0;
    for (i, p) in points.iter().enumerate() {
        if p.is_retract {
            passes.push(&points[start..=i]);
            start = i + 1;
        }
    }
    if start < points.len() {
        passes.push(&points[start..]);
    }
    passes
}

/// Rotated copies of the preview for each replay of a rotation plan, in
/// the same order the emitter indexes the A axis.
pub fn rotary_copies(points: &[PreviewPoint], plan: &RotationPlan) -> Vec<Vec<PreviewPoint>> {
    match plan.mode {
        RotationMode::NoRotation => vec![points.to_vec()],
        RotationMode::FullPassPerRotation => (0..plan.steps)
            .map(|k| rotate_about_x(points, plan.angle_at(k)))
            .collect(),
        RotationMode::OnePassPerRotation => preview_passes(points)
            .into_iter()
            .enumerate()
            .map(|(i, pass)| rotate_about_x(pass, plan.start_angle + i as f64 * plan.angle_step()))
            .collect(),
        RotationMode::RepeatPassOverRotation => preview_passes(points)
            .into_iter()
            .flat_map(|pass| (0..plan.steps).map(move |k| rotate_about_x(pass, plan.angle_at(k))))
            .collect(),
        RotationMode::Unknown => {
            warn!("unknown rotation mode, previewing toolpath once");
            vec![points.to_vec()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcfit::{fit_arcs_in_segments, ArcFitConfig};

    fn quarter() -> ToolpathSegment {
        ToolpathSegment::arc(
            PointXYZ::new(2.0, 0.0, 0.0),
            PointXYZ::new(0.0, 2.0, -1.0),
            ArcExtras { cw: false, cx: 0.0, cy: 0.0, r: 2.0 },
            Some(100.0),
        )
    }

    fn dist_to_segment(p: &PointXYZ, a: &PointXYZ, b: &PointXYZ) -> f64 {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len2 = dx * dx + dy * dy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
        };
        (p.x - (a.x + dx * t)).hypot(p.y - (a.y + dy * t))
    }

    #[test]
    fn test_arc_tessellation_on_circle() {
        let seg = quarter();
        let arc = seg.arc_extras().unwrap();
        let pts = tessellate_arc(&seg.pts[0], &seg.pts[1], arc, 0.01);
        assert_eq!(pts.last(), Some(&seg.pts[1]));
        assert!(pts.len() > 1);
        for p in &pts {
            assert!((p.x.hypot(p.y) - 2.0).abs() < 1e-9);
            assert!(p.y >= 0.0 && p.x >= -1e-9, "stays in the first quadrant");
        }
        // Z interpolates towards the end
        assert!(pts[0].z < 0.0 && pts[0].z > -1.0);
    }

    #[test]
    fn test_clockwise_arc_goes_the_other_way() {
        let seg = ToolpathSegment::arc(
            PointXYZ::new(0.0, 2.0, 0.0),
            PointXYZ::new(2.0, 0.0, 0.0),
            ArcExtras { cw: true, cx: 0.0, cy: 0.0, r: 2.0 },
            None,
        );
        let pts = tessellate_arc(&seg.pts[0], &seg.pts[1], seg.arc_extras().unwrap(), 0.01);
        assert!(pts.iter().all(|p| p.x >= -1e-9 && p.y >= -1e-9));
    }

    #[test]
    fn test_subdivision_cap() {
        let seg = quarter();
        let pts = tessellate_arc(&seg.pts[0], &seg.pts[1], seg.arc_extras().unwrap(), 1e-12);
        assert_eq!(pts.len(), MAX_ARC_SUBDIVISIONS);
    }

    #[test]
    fn test_flags_and_dedup() {
        let segs = vec![
            ToolpathSegment::rapid(PointXYZ::new(2.0, 5.0, 0.0)),
            ToolpathSegment::plunge(PointXYZ::new(2.0, 0.0, 0.0), Some(40.0)),
            quarter(),
            ToolpathSegment::retract(PointXYZ::new(0.0, 5.0, -1.0), Some(40.0)),
        ];
        let pts = tessellate_segments(&segs, &TessellationConfig::default());
        assert!(pts[0].is_rapid && !pts[0].is_cut);
        assert!(pts[1].is_cut && !pts[1].is_arc);
        // arc start equals the plunge point and is not repeated
        assert_ne!(pts[2].position, pts[1].position);
        assert!(pts[2].is_arc);
        assert!(pts.last().unwrap().is_retract);
        for w in pts.windows(2) {
            assert_ne!(w[0].position, w[1].position);
        }
    }

    #[test]
    fn test_fitted_arcs_reproduce_source_points() {
        let source: Vec<PointXYZ> = (0..40)
            .map(|i| {
                let a = i as f64 / 39.0 * std::f64::consts::FRAC_PI_2;
                PointXYZ::new(4.0 * a.cos(), 4.0 * a.sin(), -0.5)
            })
            .collect();
        let cfg = ArcFitConfig::default();
        let fitted = fit_arcs_in_segments(&[ToolpathSegment::cut(source.clone(), Some(100.0))], &cfg).unwrap();
        assert!(fitted[0].arc_extras().is_some());

        let preview = tessellate_segments(&fitted, &TessellationConfig::default().arc_res(cfg.tol));
        let poly: Vec<PointXYZ> = preview.iter().map(|p| p.position).collect();
        for p in &source {
            let d = poly
                .windows(2)
                .map(|w| dist_to_segment(p, &w[0], &w[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(d <= cfg.tol, "source point {:?} is {} from preview", p, d);
        }
    }

    #[test]
    fn test_rotary_copies() {
        let pts = vec![
            PreviewPoint::new(PointXYZ::new(0.0, 1.0, 0.0), &Motion::Cut),
            PreviewPoint::new(PointXYZ::new(1.0, 5.0, 0.0), &Motion::Retract),
            PreviewPoint::new(PointXYZ::new(0.0, 1.0, 0.0), &Motion::Cut),
            PreviewPoint::new(PointXYZ::new(1.0, 5.0, 0.0), &Motion::Retract),
        ];

        let full = rotary_copies(&pts, &RotationPlan::new(RotationMode::FullPassPerRotation, 4));
        assert_eq!(full.len(), 4);
        let q = full[1][0].position;
        assert!(q.y.abs() < 1e-12 && (q.z - 1.0).abs() < 1e-12, "90 degrees about X maps Y to Z");

        let one = rotary_copies(&pts, &RotationPlan::new(RotationMode::OnePassPerRotation, 2));
        assert_eq!(one.len(), 2);
        assert_eq!(one[0].len(), 2);

        let repeat = rotary_copies(&pts, &RotationPlan::new(RotationMode::RepeatPassOverRotation, 3));
        assert_eq!(repeat.len(), 6);

        let none = rotary_copies(&pts, &RotationPlan::new(RotationMode::NoRotation, 0));
        assert_eq!(none, vec![pts.clone()]);
    }
}
