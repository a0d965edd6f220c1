//! wheelpath - 4-axis toolpaths for clock wheel and pinion cutting
//!
//! Pipeline: boundary lines -> `morph` -> `planner` -> `arcfit` -> `post`
//! (G-code) and `preview` (tessellated points), tied together by `job`.

pub mod arcfit;
pub mod error;
pub mod fitting;
pub mod geometry;
pub mod job;
pub mod morph;
pub mod planner;
pub mod post;
pub mod preview;
pub mod tool_library;
pub mod toolpath;
pub mod validator;

pub use error::{Result, ToolpathError};
pub use geometry::PointXYZ;
pub use job::{ConstructProps, Constructed, JobFile, PassDefinition};
pub use toolpath::{Pass, ToolpathSegment};

/// Initialize logging to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    // a second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcfit::{fit_arcs_in_segments, ArcFitConfig};
    use crate::morph::{max_lateral_gap, morph_lines_adaptive, MorphConfig};
    use crate::planner::{plan_segments_from_passes, PlannerConfig};
    use crate::post::{generate_gcode, PostProcessor, RotaryMillPost, RotationMode, RotationPlan, ToolSetup};
    use crate::toolpath::Motion;

    fn line_a() -> Vec<PointXYZ> {
        vec![PointXYZ::new(3.0, 0.0, -0.5), PointXYZ::new(-17.0, 0.0, -0.5)]
    }

    fn line_b() -> Vec<PointXYZ> {
        vec![
            PointXYZ::new(3.0, 1.3, -0.5),
            PointXYZ::new(-0.45, 1.3, -0.5),
            PointXYZ::new(-0.45, 0.7, -0.5),
            PointXYZ::new(-15.0, 0.7, -0.5),
            PointXYZ::new(-17.0, 0.0, -0.5),
        ]
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let passes = morph_lines_adaptive(&line_a(), &line_b(), &MorphConfig::new(0.2)).unwrap();
        assert!(passes.len() >= 2);
        let n = passes[0].len();
        assert!(n >= 5);
        for w in passes.windows(2) {
            assert_eq!(w[1].len(), n);
            assert!(max_lateral_gap(&w[0], &w[1]) <= 0.2 + 1e-6);
        }

        let segments = plan_segments_from_passes(&passes, &PlannerConfig::new(5.0, 0.2, 200.0).cut_z(-0.5)).unwrap();
        let first = segments.first().unwrap();
        let last = segments.last().unwrap();
        assert_eq!(first.motion, Motion::Rapid);
        assert_eq!(first.pts[0].y, 5.0);
        assert_eq!(last.motion, Motion::Retract);
        assert_eq!(last.pts[0].y, 5.0);

        let fitted = fit_arcs_in_segments(&segments, &ArcFitConfig::default()).unwrap();
        assert_eq!(
            fitted.iter().filter(|s| s.is_retract()).count(),
            passes.len(),
            "one retract per pass survives fitting"
        );

        let plan = RotationPlan::new(RotationMode::RepeatPassOverRotation, 3);
        let tool = ToolSetup {
            tool_number: 1,
            spindle_speed: 6112.0,
        };
        let out = generate_gcode(&fitted, &tool, Some(&plan)).unwrap();
        let post = RotaryMillPost::default();
        let body = &out.lines[post.preamble(&tool).len()..out.lines.len() - post.postamble().len()];
        let a_moves = body.iter().filter(|l| l.starts_with("G0 A")).count();
        assert_eq!(a_moves, passes.len() * 3);
        assert_eq!(out.lines.last().map(|l| l.starts_with("M30")), Some(true));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
