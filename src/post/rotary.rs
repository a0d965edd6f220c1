//! Rotary G-code emitter
//!
//! Emits a segment list as a complete program, interleaving A-axis indexing
//! with replays of the toolpath according to a `RotationPlan`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{format_number, GCodeOutput, PostProcessor, RotaryMillPost, ToolSetup};
use crate::error::{Result, ToolpathError};
use crate::geometry::PointXYZ;
use crate::preview::tessellate_arc;
use crate::toolpath::{split_into_passes, Motion, ToolpathSegment};
use crate::validator::Validator;

/// Chord height used when a post cannot emit G2/G3.
const LINEARIZE_CHORD: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationMode {
    /// Emit the toolpath once at the current angle.
    NoRotation,
    /// Replay the whole toolpath at every angle.
    FullPassPerRotation,
    /// One pass per angle, advancing after each pass.
    OnePassPerRotation,
    /// Replay each pass at every angle before moving to the next pass.
    RepeatPassOverRotation,
    #[serde(other)]
    Unknown,
}

/// How the A axis is indexed around the toolpath.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationPlan {
    pub mode: RotationMode,
    pub steps: u32,
    #[serde(default)]
    pub start_angle: f64,
    #[serde(default = "full_turn")]
    pub end_angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_after_completed: Option<f64>,
}

fn full_turn() -> f64 {
    360.0
}

impl RotationPlan {
    pub fn new(mode: RotationMode, steps: u32) -> Self {
        Self {
            mode,
            steps,
            start_angle: 0.0,
            end_angle: 360.0,
            angle_after_completed: None,
        }
    }

    pub fn angles(mut self, start: f64, end: f64) -> Self {
        self.start_angle = start;
        self.end_angle = end;
        self
    }

    pub fn angle_after_completed(mut self, angle: f64) -> Self {
        self.angle_after_completed = Some(angle);
        self
    }

    pub fn angle_step(&self) -> f64 {
        (self.end_angle - self.start_angle) / self.steps as f64
    }

    /// Angle of rotation increment `k`.
    pub fn angle_at(&self, k: u32) -> f64 {
        self.start_angle + k as f64 * self.angle_step()
    }

    fn validate(&self) -> Result<()> {
        let indexed = !matches!(self.mode, RotationMode::NoRotation | RotationMode::Unknown);
        if indexed && self.steps == 0 {
            return Err(ToolpathError::invalid_parameter("rotation steps", self.steps));
        }
        if !(self.start_angle.is_finite() && self.end_angle.is_finite()) {
            return Err(ToolpathError::invalid_parameter(
                "rotation angles",
                format!("{}..{}", self.start_angle, self.end_angle),
            ));
        }
        Ok(())
    }
}

pub struct GCodeEmitter<'a> {
    post: &'a dyn PostProcessor,
    validator: Validator,
    output: GCodeOutput,
    last_feed: Option<f64>,
}

impl<'a> GCodeEmitter<'a> {
    pub fn new(post: &'a dyn PostProcessor) -> Self {
        Self {
            post,
            validator: Validator::new(),
            output: GCodeOutput::new(),
            last_feed: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Emit preamble, motion body and postamble.
    pub fn generate(
        mut self,
        segments: &[ToolpathSegment],
        tool: &ToolSetup,
        rotation: Option<&RotationPlan>,
    ) -> Result<GCodeOutput> {
        if let Err(errors) = self.validator.validate_segments(segments) {
            let first = &errors[0];
            return Err(ToolpathError::MalformedSegment {
                index: first.index(),
                reason: first.to_string(),
            });
        }
        if let Some(plan) = rotation {
            plan.validate()?;
        }

        self.output.extend(self.post.preamble(tool));

        match rotation {
            None => self.emit_segments(segments),
            Some(plan) => self.emit_rotary(segments, plan),
        }

        if let Some(angle) = rotation.and_then(|p| p.angle_after_completed) {
            self.emit_angle(angle);
        }

        self.output.extend(self.post.postamble());

        debug!(
            post = self.post.name(),
            lines = self.output.len(),
            "generated program"
        );
        Ok(self.output)
    }

    fn emit_rotary(&mut self, segments: &[ToolpathSegment], plan: &RotationPlan) {
        match plan.mode {
            RotationMode::NoRotation => self.emit_segments(segments),
            RotationMode::FullPassPerRotation => {
                for k in 0..plan.steps {
                    self.emit_angle(plan.angle_at(k));
                    self.emit_segments(segments);
                }
            }
            RotationMode::OnePassPerRotation => {
                let passes = split_into_passes(segments);
                if passes.len() != plan.steps as usize {
                    warn!(passes = passes.len(), steps = plan.steps, "pass count does not match rotation steps");
                    self.output.emit_comment(&format!(
                        "WARNING: {} passes for {} rotation steps",
                        passes.len(),
                        plan.steps
                    ));
                }
                self.emit_angle(plan.start_angle);
                for (i, pass) in passes.iter().enumerate() {
                    if i > 0 {
                        self.emit_angle(plan.start_angle + i as f64 * plan.angle_step());
                    }
                    self.emit_segments(pass);
                }
            }
            RotationMode::RepeatPassOverRotation => {
                // k = 0 returns A to the start angle before each pass
                for pass in split_into_passes(segments) {
                    for k in 0..plan.steps {
                        self.emit_angle(plan.angle_at(k));
                        self.emit_segments(pass);
                    }
                }
            }
            RotationMode::Unknown => {
                warn!("unknown rotation mode, emitting toolpath once");
                self.output
                    .emit_comment("WARNING: unknown rotation mode, emitting toolpath once");
                self.emit_segments(segments);
            }
        }
    }

    fn emit_angle(&mut self, angle: f64) {
        self.output.emit(format!("G0 A{:.3}", angle));
    }

    fn emit_segments(&mut self, segments: &[ToolpathSegment]) {
        for seg in segments {
            match &seg.motion {
                Motion::Rapid => {
                    for p in &seg.pts {
                        self.output.emit(format!("G0 {}", xyz(p)));
                    }
                }
                Motion::Plunge | Motion::Cut | Motion::Retract => {
                    for p in &seg.pts {
                        let block = format!("G1 {}{}", xyz(p), self.feed_word(seg.feed));
                        self.output.emit(block);
                    }
                }
                Motion::Arc(arc) => {
                    let (start, end) = (seg.pts[0], seg.pts[1]);
                    if self.post.supports_arcs() {
                        let block = format!(
                            "{} {} I{:.3} J{:.3}{}",
                            if arc.cw { "G2" } else { "G3" },
                            xyz(&end),
                            arc.cx - start.x,
                            arc.cy - start.y,
                            self.feed_word(seg.feed)
                        );
                        self.output.emit(block);
                    } else {
                        for p in tessellate_arc(&start, &end, arc, LINEARIZE_CHORD) {
                            let block = format!("G1 {}{}", xyz(&p), self.feed_word(seg.feed));
                            self.output.emit(block);
                        }
                    }
                }
            }
        }
    }

    /// ` F<feed>` when the feed changes, otherwise nothing.
    fn feed_word(&mut self, feed: Option<f64>) -> String {
        match feed {
            Some(f) if self.last_feed != Some(f) => {
                self.last_feed = Some(f);
                format!(" F{}", format_number(f))
            }
            _ => String::new(),
        }
    }
}

fn xyz(p: &PointXYZ) -> String {
    format!("X{:.3} Y{:.3} Z{:.3}", p.x, p.y, p.z)
}

/// Emit a program with the default rotary post.
pub fn generate_gcode(
    segments: &[ToolpathSegment],
    tool: &ToolSetup,
    rotation: Option<&RotationPlan>,
) -> Result<GCodeOutput> {
    let post = RotaryMillPost::default();
    GCodeEmitter::new(&post).generate(segments, tool, rotation)
}
