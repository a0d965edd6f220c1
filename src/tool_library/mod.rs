//! Bit library - cutter definitions with per-material cutting data
//!
//! Bits can be defined in a separate JSON file and referenced by ID.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, ToolpathError};

/// Cutting data for one bit in one stock material.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCutData {
    /// Spindle speed (RPM)
    pub spindle_speed: f64,
    /// Cutting feed (mm/min)
    pub feed_rate: f64,
    /// Lateral step between passes (mm)
    pub step_over: f64,
}

/// Bit definition from JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bit {
    /// Cutter diameter (mm)
    pub diameter: f64,

    /// Flute length (mm)
    pub height: f64,

    /// T-number in the machine's tool table
    pub tool_number: u32,

    /// Cutting data keyed by material name (e.g. "A2")
    #[serde(default, rename = "material")]
    pub materials: BTreeMap<String, MaterialCutData>,
}

impl Bit {
    pub fn new(diameter: f64, height: f64, tool_number: u32) -> Self {
        Self {
            diameter,
            height,
            tool_number,
            materials: BTreeMap::new(),
        }
    }

    pub fn with_material(mut self, name: &str, data: MaterialCutData) -> Self {
        self.materials.insert(name.to_string(), data);
        self
    }

    /// Look up cutting data, failing when the bit has no entry for `material`.
    pub fn cut_data(&self, material: &str) -> Result<&MaterialCutData> {
        self.materials
            .get(material)
            .ok_or_else(|| ToolpathError::MaterialNotFound {
                material: material.to_string(),
                tool_number: self.tool_number,
            })
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }
}

/// Bit library - collection of bit definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BitLibrary {
    /// Bits indexed by ID
    #[serde(flatten)]
    pub bits: HashMap<String, Bit>,
}

impl BitLibrary {
    /// Load bit library from JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let library: BitLibrary = serde_json::from_str(&content)?;
        Ok(library)
    }

    pub fn get(&self, id: &str) -> Option<&Bit> {
        self.bits.get(id)
    }

    /// List all bits as (id, bit), sorted by ID
    pub fn list(&self) -> Vec<(&str, &Bit)> {
        let mut bits: Vec<_> = self.bits.iter().map(|(k, v)| (k.as_str(), v)).collect();
        bits.sort_by(|a, b| a.0.cmp(b.0));
        bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn insert(&mut self, id: &str, bit: Bit) {
        self.bits.insert(id.to_string(), bit);
    }
}

const A2_FINE: MaterialCutData = MaterialCutData {
    spindle_speed: 19404.0,
    feed_rate: 99.0,
    step_over: 0.08,
};

const A2_2_FLUTE: MaterialCutData = MaterialCutData {
    spindle_speed: 11937.0,
    feed_rate: 127.0,
    step_over: 0.25,
};

const A2_4_FLUTE: MaterialCutData = MaterialCutData {
    spindle_speed: 6112.0,
    feed_rate: 200.0,
    step_over: 0.55,
};

/// Carbide bits used for wheel and pinion cutting, with A2 tool steel data.
pub fn default_bit_library() -> BitLibrary {
    let mut lib = BitLibrary::default();
    lib.insert("bit1mm", Bit::new(1.0, 10.0, 3).with_material("A2", A2_FINE));
    lib.insert("bit1_6mm_2_flute", Bit::new(1.6256, 10.0, 2).with_material("A2", A2_2_FLUTE));
    lib.insert("bit3_175mm_2_flute", Bit::new(3.175, 10.0, 1).with_material("A2", A2_2_FLUTE));
    lib.insert(
        "bit3_175mm_4_flute_harvey",
        Bit::new(3.175, 10.0, 3).with_material("A2", A2_4_FLUTE),
    );
    lib.insert("bit3_175mm_4_flute", Bit::new(3.175, 10.0, 1).with_material("A2", A2_4_FLUTE));
    lib
}

/// Bit used when a pass does not name one.
pub fn default_bit() -> Bit {
    Bit::new(3.175, 10.0, 1).with_material("A2", A2_4_FLUTE)
}
