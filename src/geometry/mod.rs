//! Geometry primitives
//!
//! Points, the line/arc profile segment model, and the polyline helpers
//! (resampling, densifying, direction normalization) the morpher is built on.
//! All coordinates are millimeters.

use cgmath::{InnerSpace, Vector3};
use serde::{Deserialize, Serialize};

pub mod resample;

pub use resample::*;

/// A point in machine space. X runs along the stock, Y is the lateral
/// (radial) offset and Z is depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointXYZ {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl PointXYZ {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_vec(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn distance_to(&self, other: &PointXYZ) -> f64 {
        (other.to_vec() - self.to_vec()).magnitude()
    }

    /// Distance in the X/Y plane only.
    pub fn distance_xy(&self, other: &PointXYZ) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn lerp(&self, other: &PointXYZ, t: f64) -> PointXYZ {
        PointXYZ::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    pub fn with_y(self, y: f64) -> PointXYZ {
        PointXYZ { y, ..self }
    }

    pub fn with_z(self, z: f64) -> PointXYZ {
        PointXYZ { z, ..self }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<(f64, f64, f64)> for PointXYZ {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<(f64, f64)> for PointXYZ {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y, 0.0)
    }
}

/// Raw profile record as found in gear tables: an arc when `center` is set,
/// a straight line otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub from: PointXYZ,
    pub to: PointXYZ,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<PointXYZ>,
}

/// Profile segment. Build it through the constructors, which derive
/// `length` (and arc sense) from the endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        from: PointXYZ,
        to: PointXYZ,
        length: f64,
    },
    Arc {
        from: PointXYZ,
        to: PointXYZ,
        center: PointXYZ,
        anticlockwise: bool,
        length: f64,
    },
}

impl Segment {
    pub fn line(from: PointXYZ, to: PointXYZ) -> Self {
        Segment::Line {
            from,
            to,
            length: from.distance_to(&to),
        }
    }

    /// Build an arc from its endpoints and center.
    ///
    /// Profile arcs sweep in the X/Z plane; the sense comes from the sign of
    /// the X/Z cross product of (from - center) and (to - center), positive
    /// meaning anticlockwise. The radius is taken from `from`.
    pub fn arc(from: PointXYZ, to: PointXYZ, center: PointXYZ) -> Self {
        let v1 = from.to_vec() - center.to_vec();
        let v2 = to.to_vec() - center.to_vec();
        let cross = v1.x * v2.z - v1.z * v2.x;
        let radius = v1.magnitude();

        let sweep = if v1.magnitude2() == 0.0 || v2.magnitude2() == 0.0 {
            0.0
        } else {
            v1.angle(v2).0
        };

        Segment::Arc {
            from,
            to,
            center,
            anticlockwise: cross > 0.0,
            length: radius * sweep,
        }
    }

    pub fn from_record(record: &ProfileRecord) -> Self {
        match record.center {
            Some(center) => Segment::arc(record.from, record.to, center),
            None => Segment::line(record.from, record.to),
        }
    }

    pub fn from(&self) -> PointXYZ {
        match self {
            Segment::Line { from, .. } | Segment::Arc { from, .. } => *from,
        }
    }

    pub fn to(&self) -> PointXYZ {
        match self {
            Segment::Line { to, .. } | Segment::Arc { to, .. } => *to,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Segment::Line { length, .. } | Segment::Arc { length, .. } => *length,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, Segment::Arc { .. })
    }

    pub fn radius(&self) -> Option<f64> {
        match self {
            Segment::Arc { from, center, .. } => Some(center.distance_to(from)),
            Segment::Line { .. } => None,
        }
    }

    /// Same path walked the other way; arcs flip their sense.
    pub fn reversed(&self) -> Self {
        match *self {
            Segment::Line { from, to, .. } => Segment::line(to, from),
            Segment::Arc { from, to, center, .. } => Segment::arc(to, from, center),
        }
    }

    /// Return a copy with new endpoints, recomputing length (and sense for arcs).
    pub fn with_endpoints(&self, from: PointXYZ, to: PointXYZ) -> Self {
        match *self {
            Segment::Line { .. } => Segment::line(from, to),
            Segment::Arc { center, .. } => Segment::arc(from, to, center),
        }
    }

    pub fn to_record(&self) -> ProfileRecord {
        match *self {
            Segment::Line { from, to, .. } => ProfileRecord {
                from,
                to,
                center: None,
            },
            Segment::Arc { from, to, center, .. } => ProfileRecord {
                from,
                to,
                center: Some(center),
            },
        }
    }
}

/// Walk a record list backwards: order is reversed and every record has its
/// endpoints swapped. Arc sense flips on conversion since it is derived.
pub fn reverse_segment_list(records: &[ProfileRecord]) -> Vec<ProfileRecord> {
    records
        .iter()
        .rev()
        .map(|r| ProfileRecord {
            from: r.to,
            to: r.from,
            center: r.center,
        })
        .collect()
}

/// Total length of a profile.
pub fn profile_length(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::length).sum()
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}
