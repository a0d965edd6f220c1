//! Post-processors for machine-specific G-code output
//!
//! A post supplies the fixed program preamble and postamble around the
//! motion body produced by the rotary emitter.

pub mod rotary;

pub use rotary::{generate_gcode, GCodeEmitter, RotationMode, RotationPlan};

/// Default tool-length-offset clearance height (mm).
pub const DEFAULT_CLEARANCE_Z: f64 = 15.45;

/// Emitted program text, one G-code block per line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GCodeOutput {
    pub lines: Vec<String>,
}

impl GCodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, code: impl Into<String>) {
        self.lines.push(code.into());
    }

    pub fn emit_comment(&mut self, comment: &str) {
        self.lines.push(format!("; {}", comment));
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        self.lines.extend(lines);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl std::fmt::Display for GCodeOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Tool parameters the preamble needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSetup {
    pub tool_number: u32,
    pub spindle_speed: f64,
}

/// Post-processor trait - implemented for each controller type
pub trait PostProcessor {
    /// Program start: modal state, tool change, spindle, coolant, offsets.
    fn preamble(&self, tool: &ToolSetup) -> Vec<String>;

    /// Program end: coolant/spindle off, homing, A reset, M30.
    fn postamble(&self) -> Vec<String>;

    /// Machine/controller name
    fn name(&self) -> &str;

    /// Whether G2/G3 are emitted; otherwise arcs are linearized.
    fn supports_arcs(&self) -> bool;
}

/// 4-axis mill with the A axis rotating about X.
#[derive(Debug, Clone)]
pub struct RotaryMillPost {
    pub clearance_z: f64,
    pub arc_support: bool,
}

impl Default for RotaryMillPost {
    fn default() -> Self {
        Self {
            clearance_z: DEFAULT_CLEARANCE_Z,
            arc_support: true,
        }
    }
}

impl RotaryMillPost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clearance(mut self, z: f64) -> Self {
        self.clearance_z = z;
        self
    }

    /// Emit arcs as G1 chords for controllers without G2/G3.
    pub fn without_arcs(mut self) -> Self {
        self.arc_support = false;
        self
    }
}

impl PostProcessor for RotaryMillPost {
    fn preamble(&self, tool: &ToolSetup) -> Vec<String> {
        vec![
            "G90 G94 G91.1 G40 G49 G17 ; Modal safe state".to_string(),
            "G21 ; Metric mode".to_string(),
            "G28 G91 Z0. ; Home Z axis".to_string(),
            "G90 ; Absolute mode".to_string(),
            format!("T{} M6 ; Tool change", tool.tool_number),
            format!("S{} M3 ; Spindle on", format_number(tool.spindle_speed)),
            "G4 P1 ; Spindle spin-up".to_string(),
            "M8 ; Coolant on".to_string(),
            "G54 ; Work coordinate system".to_string(),
            format!(
                "G0 G43 Z{:.3} H{} ; Tool length offset and retract",
                self.clearance_z, tool.tool_number
            ),
        ]
    }

    fn postamble(&self) -> Vec<String> {
        vec![
            "M9 ; Coolant off".to_string(),
            "M5 ; Spindle stop".to_string(),
            "G28 G91 Z0. ; Home Z axis".to_string(),
            "G90 ; Absolute mode".to_string(),
            "G0 A0. ; Reset A axis".to_string(),
            "G28 G91 X0. Y0. ; Home X and Y axes".to_string(),
            "G90 ; Absolute mode".to_string(),
            "M30 ; Program end and rewind".to_string(),
        ]
    }

    fn name(&self) -> &str {
        "4-axis rotary mill"
    }

    fn supports_arcs(&self) -> bool {
        self.arc_support
    }
}

/// Format to 3 decimals with trailing zeros removed (`80`, `127.5`).
pub fn format_number(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preamble() {
        let post = RotaryMillPost::new();
        let lines = post.preamble(&ToolSetup {
            tool_number: 2,
            spindle_speed: 11937.0,
        });
        let codes: Vec<&str> = lines.iter().map(|l| code_part(l)).collect();
        assert_eq!(
            codes,
            vec![
                "G90 G94 G91.1 G40 G49 G17",
                "G21",
                "G28 G91 Z0.",
                "G90",
                "T2 M6",
                "S11937 M3",
                "G4 P1",
                "M8",
                "G54",
                "G0 G43 Z15.450 H2",
            ]
        );
    }

    #[test]
    fn test_postamble() {
        let lines = RotaryMillPost::new().postamble();
        let codes: Vec<&str> = lines.iter().map(|l| code_part(l)).collect();
        assert_eq!(
            codes,
            vec!["M9", "M5", "G28 G91 Z0.", "G90", "G0 A0.", "G28 G91 X0. Y0.", "G90", "M30"]
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(80.0), "80");
        assert_eq!(format_number(127.5), "127.5");
        assert_eq!(format_number(99.12345), "99.123");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_output_display() {
        let mut out = GCodeOutput::new();
        out.emit("G0 X1.000");
        out.emit_comment("done");
        assert_eq!(out.to_string(), "G0 X1.000\n; done");
        assert_eq!(out.len(), 2);
    }

    fn code_part(line: &str) -> &str {
        line.split(';').next().unwrap_or("").trim()
    }
}
