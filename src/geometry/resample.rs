//! Polyline resampling and densifying
//!
//! The morpher compares lines index by index, so every helper here is about
//! producing point-for-point correspondence between two polylines.

use serde::{Deserialize, Serialize};

use super::PointXYZ;
use crate::error::{Result, ToolpathError};

/// How two lines are brought to point-for-point correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resample {
    /// Shorter line is resampled onto the X positions of the longer one.
    #[default]
    XAligned,
    /// Both lines are resampled to the larger count, uniform in arc length.
    ArcLength,
}

impl Resample {
    pub fn equalize(self, a: Vec<PointXYZ>, b: Vec<PointXYZ>) -> Result<(Vec<PointXYZ>, Vec<PointXYZ>)> {
        match self {
            Resample::XAligned => equalize_counts(a, b),
            Resample::ArcLength => {
                let count = a.len().max(b.len());
                Ok((resample_uniform(&a, count)?, resample_uniform(&b, count)?))
            }
        }
    }
}

/// Resample `line` to `count` points spaced uniformly by X/Y arc length.
/// The first and last points are kept exactly.
pub fn resample_uniform(line: &[PointXYZ], count: usize) -> Result<Vec<PointXYZ>> {
    if line.len() < 2 {
        return Err(ToolpathError::too_few_points("resampled line", line.len()));
    }
    if count < 2 {
        return Err(ToolpathError::invalid_parameter("resample count", count));
    }

    let mut cumulative = Vec::with_capacity(line.len());
    cumulative.push(0.0);
    let mut total = 0.0;
    for w in line.windows(2) {
        total += w[0].distance_xy(&w[1]);
        cumulative.push(total);
    }

    let last_seg = line.len() - 2;
    let step = total / (count - 1) as f64;
    let mut seg = 0;
    let mut result = Vec::with_capacity(count);

    for i in 0..count {
        let dist = step * i as f64;
        while seg < last_seg && dist > cumulative[seg + 1] {
            seg += 1;
        }
        let seg_len = cumulative[seg + 1] - cumulative[seg];
        let t = if seg_len == 0.0 {
            0.0
        } else {
            ((dist - cumulative[seg]) / seg_len).clamp(0.0, 1.0)
        };
        result.push(line[seg].lerp(&line[seg + 1], t));
    }

    result[count - 1] = line[line.len() - 1];
    Ok(result)
}

/// Resample `line` onto the X positions of `reference`.
///
/// The line is sorted by X and linearly interpolated in Y and Z at each
/// reference X; reference X values outside the line's range extrapolate
/// from the end segments.
pub fn resample_to_reference(line: &[PointXYZ], reference: &[PointXYZ]) -> Result<Vec<PointXYZ>> {
    if line.len() < 2 {
        return Err(ToolpathError::too_few_points("resampled line", line.len()));
    }

    let mut sorted = line.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let result = reference
        .iter()
        .map(|r| {
            let mut i = 0;
            while i < sorted.len() - 1 && sorted[i + 1].x < r.x {
                i += 1;
            }
            let p0 = sorted[i];
            let p1 = sorted.get(i + 1).copied().unwrap_or(p0);

            let dx = p1.x - p0.x;
            let t = (r.x - p0.x) / if dx == 0.0 { 1.0 } else { dx };
            PointXYZ::new(r.x, p0.y + (p1.y - p0.y) * t, p0.z + (p1.z - p0.z) * t)
        })
        .collect();

    Ok(result)
}

/// A line is closed when its first and last points coincide in X/Y.
pub fn is_closed(line: &[PointXYZ]) -> bool {
    match (line.first(), line.last()) {
        (Some(a), Some(b)) if line.len() > 2 => a.x == b.x && a.y == b.y,
        _ => false,
    }
}

/// Subdivide every segment so none is longer than `max_seg` (3D chord).
/// Closed lines stay closed: the result ends on a copy of its first point.
pub fn densify(line: &[PointXYZ], max_seg: f64) -> Result<Vec<PointXYZ>> {
    if max_seg.is_nan() || max_seg <= 0.0 {
        return Err(ToolpathError::invalid_parameter("max_seg", max_seg));
    }
    if line.len() < 2 {
        return Ok(line.to_vec());
    }

    let closed = is_closed(line);
    let mut dense = Vec::with_capacity(line.len());

    for w in line.windows(2) {
        let (p0, p1) = (w[0], w[1]);
        let pieces = ((p0.distance_to(&p1) / max_seg).ceil() as usize).max(1);
        for s in 0..pieces {
            dense.push(p0.lerp(&p1, s as f64 / pieces as f64));
        }
    }

    let end = if closed { dense[0] } else { line[line.len() - 1] };
    dense.push(end);
    Ok(dense)
}

/// Orient a line so that the end with the larger X comes first.
pub fn normalize_right_to_left(line: Vec<PointXYZ>) -> Vec<PointXYZ> {
    match (line.first(), line.last()) {
        (Some(first), Some(last)) if first.x < last.x => line.into_iter().rev().collect(),
        _ => line,
    }
}

/// Bring two lines to the same point count, resampling the shorter one onto
/// the X positions of the longer one.
pub fn equalize_counts(a: Vec<PointXYZ>, b: Vec<PointXYZ>) -> Result<(Vec<PointXYZ>, Vec<PointXYZ>)> {
    use std::cmp::Ordering;

    match a.len().cmp(&b.len()) {
        Ordering::Less => Ok((resample_to_reference(&a, &b)?, b)),
        Ordering::Greater => {
            let b = resample_to_reference(&b, &a)?;
            Ok((a, b))
        }
        Ordering::Equal => Ok((a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> PointXYZ {
        PointXYZ::new(x, y, 0.0)
    }

    #[test]
    fn test_resample_uniform_spacing() {
        let line = vec![p(0.0, 0.0), p(10.0, 0.0)];
        let out = resample_uniform(&line, 5).unwrap();
        assert_eq!(out.len(), 5);
        for (i, pt) in out.iter().enumerate() {
            assert!((pt.x - 2.5 * i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_resample_uniform_keeps_endpoints_on_bent_line() {
        let line = vec![p(0.0, 0.0), p(3.0, 0.0), p(3.0, 4.0)];
        let out = resample_uniform(&line, 8).unwrap();
        assert_eq!(out.first(), line.first());
        assert_eq!(out.last(), line.last());
        assert!(out.iter().all(|q| q.is_finite()));
    }

    #[test]
    fn test_resample_rejects_short_line() {
        assert!(resample_uniform(&[p(0.0, 0.0)], 4).is_err());
        assert!(resample_to_reference(&[p(0.0, 0.0)], &[p(1.0, 1.0)]).is_err());
    }

    #[test]
    fn test_resample_to_reference_interpolates_by_x() {
        let line = vec![p(10.0, 2.0), p(0.0, 0.0)];
        let reference = vec![p(0.0, 5.0), p(2.5, 5.0), p(10.0, 5.0)];
        let out = resample_to_reference(&line, &reference).unwrap();
        assert_eq!(out.len(), 3);
        assert!((out[1].x - 2.5).abs() < 1e-12);
        assert!((out[1].y - 0.5).abs() < 1e-12);
        assert!((out[2].y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_densify_open_line() {
        let line = vec![p(0.0, 0.0), p(1.0, 0.0)];
        let out = densify(&line, 0.25).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.last(), Some(&p(1.0, 0.0)));
        for w in out.windows(2) {
            assert!(w[0].distance_to(&w[1]) <= 0.25 + 1e-12);
        }
    }

    #[test]
    fn test_densify_closed_line_stays_closed() {
        let line = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)];
        assert!(is_closed(&line));
        let out = densify(&line, 0.3).unwrap();
        assert!(is_closed(&out));
        assert_eq!(out.first(), out.last());
    }

    #[test]
    fn test_densify_rejects_non_positive_chord() {
        assert!(densify(&[p(0.0, 0.0), p(1.0, 0.0)], 0.0).is_err());
    }

    #[test]
    fn test_normalize_right_to_left() {
        let line = vec![p(-5.0, 0.0), p(5.0, 1.0)];
        let out = normalize_right_to_left(line);
        assert_eq!(out[0], p(5.0, 1.0));

        let already = vec![p(5.0, 0.0), p(-5.0, 1.0)];
        assert_eq!(normalize_right_to_left(already.clone()), already);
    }

    #[test]
    fn test_equalize_counts() {
        let a = vec![p(3.0, 0.0), p(-17.0, 0.0)];
        let b = vec![p(3.0, 1.3), p(-0.45, 1.3), p(-0.45, 0.7), p(-15.0, 0.7), p(-17.0, 0.0)];
        let (a, b) = equalize_counts(a, b).unwrap();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(pa, pb)| pa.x == pb.x));
    }

    #[test]
    fn test_arc_length_equalize() {
        let a = vec![p(10.0, 0.0), p(0.0, 0.0)];
        let b = vec![p(10.0, 1.0), p(10.0, 0.0), p(0.0, 0.0)];
        let (a, b) = Resample::ArcLength.equalize(a, b).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        assert!((a[1].x - 5.0).abs() < 1e-12);
        // b is 11 long: its midpoint sits 5.5 along, on the bottom edge
        assert!((b[1].x - 5.5).abs() < 1e-12 && b[1].y.abs() < 1e-12);
        assert_eq!(serde_json::from_str::<Resample>(r#""arcLength""#).unwrap(), Resample::ArcLength);
    }
}
