//! Crate-wide error type

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolpathError {
    #[error("step-over must be > 0, got {0}")]
    InvalidStepOver(f64),

    #[error("{what} needs at least 2 points, got {got}")]
    TooFewPoints { what: String, got: usize },

    #[error("adaptive morph exceeded {max_iter} iterations, check boundary geometry")]
    MaxIterationsExceeded { max_iter: usize },

    #[error("material '{material}' not found for tool T{tool_number}")]
    MaterialNotFound { material: String, tool_number: u32 },

    #[error("malformed segment #{index}: {reason}")]
    MalformedSegment { index: usize, reason: String },

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolpathError {
    pub fn too_few_points(what: &str, got: usize) -> Self {
        ToolpathError::TooFewPoints {
            what: what.to_string(),
            got,
        }
    }

    pub fn invalid_parameter(name: &str, value: impl std::fmt::Display) -> Self {
        ToolpathError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolpathError>;
