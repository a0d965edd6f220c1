//! Least-squares circle fitting (Kasa method)
//!
//! Fits a circle to X/Y points by solving the 2x2 normal equations built
//! from the point moments. Degenerate input (fewer than 3 points, collinear
//! or coincident points) yields `None`, never an error.

use crate::geometry::PointXYZ;

/// Determinant below which the normal equations are treated as singular.
pub const SINGULAR_DET: f64 = 1e-9;

/// A circle in the X/Y plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Circle {
    /// Unsigned distance from `p` to the circle (X/Y only).
    pub fn residual(&self, p: &PointXYZ) -> f64 {
        ((p.x - self.cx).hypot(p.y - self.cy) - self.r).abs()
    }

    /// Largest residual over a point set.
    pub fn max_residual(&self, points: &[PointXYZ]) -> f64 {
        points.iter().map(|p| self.residual(p)).fold(0.0, f64::max)
    }

    pub fn center(&self, z: f64) -> PointXYZ {
        PointXYZ::new(self.cx, self.cy, z)
    }
}

/// Fit a circle to `points` in the X/Y plane.
pub fn fit_circle(points: &[PointXYZ]) -> Option<Circle> {
    let m = points.len();
    if m < 3 {
        return None;
    }
    let n = m as f64;

    let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut sx3, mut sy3, mut sx2y, mut sxy2) = (0.0, 0.0, 0.0, 0.0);

    for p in points {
        let (x, y) = (p.x, p.y);
        let (x2, y2) = (x * x, y * y);
        sx += x;
        sy += y;
        sxx += x2;
        syy += y2;
        sxy += x * y;
        sx3 += x2 * x;
        sy3 += y2 * y;
        sx2y += x2 * y;
        sxy2 += x * y2;
    }

    let c = n * sxx - sx * sx;
    let d = n * sxy - sx * sy;
    let e = n * syy - sy * sy;
    let g = 0.5 * (n * (sx2y + sy3) - sy * (sxx + syy));
    let h = 0.5 * (n * (sx3 + sxy2) - sx * (sxx + syy));

    let det = c * e - d * d;
    if det.abs() < SINGULAR_DET {
        return None;
    }

    let cx = (e * h - d * g) / det;
    let cy = (c * g - d * h) / det;
    let r2 = (sxx + syy - 2.0 * cx * sx - 2.0 * cy * sy + n * (cx * cx + cy * cy)) / n;
    if !(r2.is_finite() && r2 > 0.0) {
        return None;
    }

    Some(Circle { cx, cy, r: r2.sqrt() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_circle(cx: f64, cy: f64, r: f64, from_deg: f64, to_deg: f64, n: usize) -> Vec<PointXYZ> {
        (0..n)
            .map(|i| {
                let a = (from_deg + (to_deg - from_deg) * i as f64 / (n - 1) as f64).to_radians();
                PointXYZ::new(cx + r * a.cos(), cy + r * a.sin(), -0.5)
            })
            .collect()
    }

    #[test]
    fn test_fit_exact_circle() {
        let pts = on_circle(1.0, -2.0, 3.0, 0.0, 90.0, 12);
        let c = fit_circle(&pts).expect("should fit");
        assert!((c.cx - 1.0).abs() < 1e-6, "cx {}", c.cx);
        assert!((c.cy + 2.0).abs() < 1e-6, "cy {}", c.cy);
        assert!((c.r - 3.0).abs() < 1e-6, "r {}", c.r);
        assert!(c.max_residual(&pts) < 1e-6);
    }

    #[test]
    fn test_fit_circle_away_from_origin() {
        let pts = on_circle(5.0, 3.0, 2.0, 10.0, 150.0, 10);
        let c = fit_circle(&pts).expect("should fit");
        assert!((c.cx - 5.0).abs() < 1e-6, "cx {}", c.cx);
        assert!((c.cy - 3.0).abs() < 1e-6, "cy {}", c.cy);
        assert!((c.r - 2.0).abs() < 1e-6, "r {}", c.r);
    }

    #[test]
    fn test_too_few_points() {
        let pts = on_circle(0.0, 0.0, 1.0, 0.0, 90.0, 2);
        assert!(fit_circle(&pts).is_none());
    }

    #[test]
    fn test_collinear_points_are_singular() {
        let pts: Vec<PointXYZ> = (0..6).map(|i| PointXYZ::new(i as f64, 2.0 * i as f64, 0.0)).collect();
        assert!(fit_circle(&pts).is_none());
    }

    #[test]
    fn test_residual() {
        let c = Circle { cx: 0.0, cy: 0.0, r: 2.0 };
        assert!((c.residual(&PointXYZ::new(3.0, 0.0, 0.0)) - 1.0).abs() < 1e-12);
        assert!((c.residual(&PointXYZ::new(0.0, 1.5, 7.0)) - 0.5).abs() < 1e-12);
    }
}
