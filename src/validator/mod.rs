use thiserror::Error;

use crate::toolpath::{Motion, ToolpathSegment};

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("segment {index} ({kind}) has no points")]
    EmptySegment { index: usize, kind: &'static str },

    #[error("segment {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("segment {index}: feed rate out of range: {feed} (max: {max})")]
    FeedRate { index: usize, feed: f64, max: f64 },

    #[error("segment {index}: arc must have exactly 2 points, got {got}")]
    ArcPoints { index: usize, got: usize },

    #[error("segment {index}: invalid arc radius {r}")]
    ArcRadius { index: usize, r: f64 },

    #[error("segment {index}: arc endpoint is {off} off radius {r}")]
    ArcEndpoint { index: usize, off: f64, r: f64 },
}

impl ValidationError {
    /// Index of the offending segment.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::EmptySegment { index, .. }
            | ValidationError::NonFinite { index }
            | ValidationError::FeedRate { index, .. }
            | ValidationError::ArcPoints { index, .. }
            | ValidationError::ArcRadius { index, .. }
            | ValidationError::ArcEndpoint { index, .. } => *index,
        }
    }
}

/// Default validator accepts any finite positive feed; a ceiling is opt-in
/// through `with_limits`.
pub struct Validator {
    max_feed_rate: f64,
    arc_tolerance: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_feed_rate: f64::INFINITY,
            arc_tolerance: 0.01,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_feed: f64, arc_tolerance: f64) -> Self {
        Self {
            max_feed_rate: max_feed,
            arc_tolerance,
        }
    }

    pub fn validate_segments(&self, segments: &[ToolpathSegment]) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = segments
            .iter()
            .enumerate()
            .filter_map(|(i, seg)| self.validate_segment(i, seg).err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_segment(&self, index: usize, seg: &ToolpathSegment) -> Result<(), ValidationError> {
        if seg.pts.is_empty() {
            return Err(ValidationError::EmptySegment {
                index,
                kind: seg.motion.name(),
            });
        }
        if !seg.pts.iter().all(|p| p.is_finite()) {
            return Err(ValidationError::NonFinite { index });
        }

        if let Some(feed) = seg.feed {
            if !(feed.is_finite() && feed > 0.0 && feed <= self.max_feed_rate) {
                return Err(ValidationError::FeedRate {
                    index,
                    feed,
                    max: self.max_feed_rate,
                });
            }
        }

        match &seg.motion {
            Motion::Arc(arc) => {
                if seg.pts.len() != 2 {
                    return Err(ValidationError::ArcPoints {
                        index,
                        got: seg.pts.len(),
                    });
                }
                if !(arc.r.is_finite() && arc.r > 0.0) || !arc.cx.is_finite() || !arc.cy.is_finite() {
                    return Err(ValidationError::ArcRadius { index, r: arc.r });
                }
                for p in &seg.pts {
                    let off = ((p.x - arc.cx).hypot(p.y - arc.cy) - arc.r).abs();
                    if off > self.arc_tolerance {
                        return Err(ValidationError::ArcEndpoint { index, off, r: arc.r });
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointXYZ;
    use crate::toolpath::ArcExtras;

    fn arc(r: f64) -> ToolpathSegment {
        ToolpathSegment::arc(
            PointXYZ::new(1.0, 0.0, 0.0),
            PointXYZ::new(0.0, 1.0, 0.0),
            ArcExtras { cw: false, cx: 0.0, cy: 0.0, r },
            Some(100.0),
        )
    }

    #[test]
    fn test_valid_segments() {
        let segs = vec![
            ToolpathSegment::rapid(PointXYZ::new(1.0, 5.0, 0.0)),
            ToolpathSegment::plunge(PointXYZ::new(1.0, 0.0, 0.0), Some(40.0)),
            arc(1.0),
            ToolpathSegment::retract(PointXYZ::new(0.0, 5.0, 0.0), Some(40.0)),
        ];
        assert!(Validator::new().validate_segments(&segs).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut empty = ToolpathSegment::cut(vec![], Some(100.0));
        empty.feed = None;
        let segs = vec![
            empty,
            ToolpathSegment::cut(vec![PointXYZ::new(f64::NAN, 0.0, 0.0)], None),
            ToolpathSegment::plunge(PointXYZ::default(), Some(-1.0)),
            arc(2.0),
        ];
        let errors = Validator::new().validate_segments(&segs).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.iter().map(|e| e.index()).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(matches!(errors[0], ValidationError::EmptySegment { kind: "cut", .. }));
        assert!(matches!(errors[3], ValidationError::ArcEndpoint { .. }));
    }

    #[test]
    fn test_feed_limit() {
        let segs = vec![ToolpathSegment::cut(vec![PointXYZ::default(), PointXYZ::new(1.0, 0.0, 0.0)], Some(900.0))];
        assert!(Validator::new().validate_segments(&segs).is_ok());
        let errors = Validator::with_limits(500.0, 0.01).validate_segments(&segs).unwrap_err();
        assert_eq!(errors[0], ValidationError::FeedRate { index: 0, feed: 900.0, max: 500.0 });
    }

    #[test]
    fn test_fast_feed_accepted_by_default() {
        let segs = vec![ToolpathSegment::cut(vec![PointXYZ::default(), PointXYZ::new(1.0, 0.0, 0.0)], Some(6000.0))];
        assert!(Validator::new().validate_segments(&segs).is_ok());

        let segs = vec![ToolpathSegment::cut(vec![PointXYZ::default()], Some(f64::INFINITY))];
        let errors = Validator::new().validate_segments(&segs).unwrap_err();
        assert!(matches!(errors[0], ValidationError::FeedRate { index: 0, .. }));
    }

    #[test]
    fn test_arc_needs_two_points() {
        let mut seg = arc(1.0);
        seg.pts.push(PointXYZ::new(-1.0, 0.0, 0.0));
        let errors = Validator::new().validate_segments(&[seg]).unwrap_err();
        assert_eq!(errors[0], ValidationError::ArcPoints { index: 0, got: 3 });
    }
}
