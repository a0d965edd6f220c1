//! Job construction
//!
//! Ties the stages together: pick cutting data for the bit and material,
//! morph the boundary lines, plan, fit arcs and tessellate a preview. All
//! inputs arrive through `ConstructProps`; nothing is read from ambient state.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arcfit::{fit_arcs_in_segments, ArcFitConfig};
use crate::error::{Result, ToolpathError};
use crate::geometry::PointXYZ;
use crate::morph::{morph_lines_adaptive, MorphConfig};
use crate::planner::{plan_segments_from_passes, FeedPolicy, PlannerConfig};
use crate::post::{generate_gcode, GCodeOutput, RotationPlan, ToolSetup};
use crate::preview::{rotary_copies, tessellate_segments, PreviewPoint, TessellationConfig};
use crate::tool_library::{default_bit, default_bit_library, Bit, BitLibrary, MaterialCutData};
use crate::toolpath::{Pass, ToolpathSegment};

/// Clearance above the stock surface for rapids (mm).
pub const CLEARANCE: f64 = 2.0;

/// Plunge and retract feed as a fraction of the cutting feed.
pub const PLUNGE_FEED_RATIO: f64 = 0.4;

fn default_cut_z() -> f64 {
    -0.5
}

/// One machining operation: the two boundary lines the passes are morphed
/// between, plus how the result is indexed around the A axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDefinition {
    pub name: String,
    #[serde(default = "default_bit")]
    pub bit: Bit,
    pub line_a: Vec<PointXYZ>,
    pub line_b: Vec<PointXYZ>,
    /// Cut before the morphed passes, e.g. an entry slot.
    #[serde(default)]
    pub line_start: Option<Vec<PointXYZ>>,
    #[serde(default = "default_cut_z")]
    pub cut_z: f64,
    #[serde(default)]
    pub feed_policy: FeedPolicy,
    #[serde(default)]
    pub rotation: Option<RotationPlan>,
}

/// Runtime parameters for `PassDefinition::construct`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructProps {
    /// Overrides the pass's own bit.
    #[serde(default)]
    pub bit: Option<Bit>,
    pub material: String,
    pub stock_radius: f64,
    #[serde(default)]
    pub feed_rate: Option<f64>,
    #[serde(default)]
    pub step_over: Option<f64>,
}

impl ConstructProps {
    pub fn new(material: &str, stock_radius: f64) -> Self {
        Self {
            bit: None,
            material: material.to_string(),
            stock_radius,
            feed_rate: None,
            step_over: None,
        }
    }

    pub fn bit(mut self, bit: Bit) -> Self {
        self.bit = Some(bit);
        self
    }

    pub fn feed_rate(mut self, feed: f64) -> Self {
        self.feed_rate = Some(feed);
        self
    }

    pub fn step_over(mut self, step_over: f64) -> Self {
        self.step_over = Some(step_over);
        self
    }
}

/// Everything produced for one pass definition.
#[derive(Debug, Clone)]
pub struct Constructed {
    pub name: String,
    pub bit: Bit,
    /// Cutting data after overrides.
    pub cut: MaterialCutData,
    pub safe_y: f64,
    pub passes: Vec<Pass>,
    pub segments: Vec<ToolpathSegment>,
    pub preview: Vec<PreviewPoint>,
    pub rotation: Option<RotationPlan>,
}

impl Constructed {
    pub fn tool_setup(&self) -> ToolSetup {
        ToolSetup {
            tool_number: self.bit.tool_number,
            spindle_speed: self.cut.spindle_speed,
        }
    }

    /// The complete program for this pass.
    pub fn gcode(&self) -> Result<GCodeOutput> {
        generate_gcode(&self.segments, &self.tool_setup(), self.rotation.as_ref())
    }

    /// Preview copies for every rotary replay; the plain preview when the
    /// pass does not rotate.
    pub fn rotary_preview(&self) -> Vec<Vec<PreviewPoint>> {
        match &self.rotation {
            Some(plan) => rotary_copies(&self.preview, plan),
            None => vec![self.preview.clone()],
        }
    }
}

impl PassDefinition {
    pub fn construct(&self, props: &ConstructProps) -> Result<Constructed> {
        if !(props.stock_radius.is_finite() && props.stock_radius >= 0.0) {
            return Err(ToolpathError::invalid_parameter("stock_radius", props.stock_radius));
        }

        let bit = props.bit.clone().unwrap_or_else(|| self.bit.clone());
        let data = bit.cut_data(&props.material)?;
        let cut = MaterialCutData {
            spindle_speed: data.spindle_speed,
            feed_rate: props.feed_rate.unwrap_or(data.feed_rate),
            step_over: props.step_over.unwrap_or(data.step_over),
        };

        let morph = MorphConfig::new(cut.step_over).max_seg(cut.step_over);
        let mut passes = morph_lines_adaptive(&self.line_a, &self.line_b, &morph)?;
        if let Some(start) = &self.line_start {
            passes.insert(0, start.clone());
        }

        let safe_y = props.stock_radius + bit.radius() + CLEARANCE;
        let planner = PlannerConfig::new(safe_y, cut.step_over, cut.feed_rate)
            .cut_z(self.cut_z)
            .plunge_feed(cut.feed_rate * PLUNGE_FEED_RATIO)
            .feed_policy(self.feed_policy);
        let raw = plan_segments_from_passes(&passes, &planner)?;

        let segments = fit_arcs_in_segments(&raw, &ArcFitConfig::default())?;
        let preview = tessellate_segments(&segments, &TessellationConfig::default());

        info!(
            pass = %self.name,
            tool = bit.tool_number,
            material = %props.material,
            passes = passes.len(),
            segments = segments.len(),
            "constructed toolpath"
        );

        Ok(Constructed {
            name: self.name.clone(),
            bit,
            cut,
            safe_y,
            passes,
            segments,
            preview,
            rotation: self.rotation.clone(),
        })
    }
}

/// A job file: pass definitions plus the runtime parameters to build them
/// with. `bitId` selects a bit from `bits` (or the built-in carbide bits).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFile {
    #[serde(default)]
    pub bits: BitLibrary,
    #[serde(default)]
    pub bit_id: Option<String>,
    pub props: ConstructProps,
    pub passes: Vec<PassDefinition>,
}

impl JobFile {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let job: JobFile = serde_json::from_str(&content)?;
        Ok(job)
    }

    /// Props with `bitId` resolved against the job's bits, then the defaults.
    pub fn resolved_props(&self) -> Result<ConstructProps> {
        let mut props = self.props.clone();
        if let Some(id) = &self.bit_id {
            let bit = match self.bits.get(id) {
                Some(bit) => bit.clone(),
                None => default_bit_library()
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ToolpathError::invalid_parameter("bitId", id))?,
            };
            props.bit = Some(bit);
        }
        Ok(props)
    }

    pub fn construct_all(&self) -> Result<Vec<Constructed>> {
        let props = self.resolved_props()?;
        self.passes.iter().map(|p| p.construct(&props)).collect()
    }
}
