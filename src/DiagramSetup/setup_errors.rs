//! Errors and warnings of the diagram setup engine.
//!
//! Ordinary domain problems (a selection that breaks a rule, a species the
//! chosen diagram needs but the system lacks) are repaired on the spot and
//! reported as [`SetupWarning`]s. Only problems that make an operation
//! impossible are returned as [`SetupError`].
use super::concentration_types::DiagramType;
use std::fmt;
use thiserror::Error;

/// errors of the setup engine and of its file/config boundary
#[derive(Debug, Error)]
pub enum SetupError {
    /// the assignment cannot be handed over: confirm is refused, the dialog stays usable
    #[error("Configuration invariant violated: {0}")]
    InvariantViolation(String),
    /// malformed number typed by the user; the previous value is kept
    #[error("'{text}' is not a valid number")]
    NumericParse { text: String },
    #[error("{what} out of range: {value}")]
    OutOfRange { what: String, value: f64 },
    #[error("Unknown component or species index {0}")]
    UnknownComponent(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Task file error: {0}")]
    TaskFormat(String),
}

/// non-fatal, user-facing notice about a repair the engine made
#[derive(Debug, Clone, PartialEq)]
pub enum SetupWarning {
    /// a selection violated a rule and was replaced
    InvalidSelection { component: String, change: String },
    /// the requested diagram needs a species the chemical system does not have
    MissingSpecies {
        species: String,
        requested: DiagramType,
        fallback: DiagramType,
    },
}

impl SetupWarning {
    pub fn invalid(component: &str, change: impl Into<String>) -> Self {
        SetupWarning::InvalidSelection {
            component: component.to_string(),
            change: change.into(),
        }
    }
}

impl fmt::Display for SetupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupWarning::InvalidSelection { component, change } => {
                write!(f, "{}: {}", component, change)
            }
            SetupWarning::MissingSpecies {
                species,
                requested,
                fallback,
            } => write!(
                f,
                "\"{}\" needs {} in the chemical system; diagram changed to \"{}\"",
                requested.label(false),
                species,
                fallback.label(false)
            ),
        }
    }
}
