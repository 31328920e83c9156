//! Error types for the VeloFit analysis core.
//!
//! Every fallible operation in the crate returns one of the types defined
//! here. Lower-level errors ([`GeometryError`], [`ConfigError`]) convert into
//! the top-level [`FitError`] via [`From`], so orchestration code can use `?`
//! throughout.
//!
//! ## Hierarchy
//!
//! ```text
//! FitError (top-level)
//! ├── GeometryError   (degenerate or non-finite joint geometry)
//! └── ConfigError     (range profiles, analysis settings, file loading)
//! ```
//!
//! # Example
//!
//! ```rust
//! use velofit_core::error::{FitError, FitResult};
//!
//! fn require_frames(available: usize) -> FitResult<()> {
//!     if available < 3 {
//!         return Err(FitError::InsufficientData { required: 3, available });
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_frames(2).unwrap_err().aborts_run());
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::AnalysisStage;

// ---------------------------------------------------------------------------
// FitResult
// ---------------------------------------------------------------------------

/// A specialized `Result` type for analysis operations.
pub type FitResult<T> = Result<T, FitError>;

// ---------------------------------------------------------------------------
// FitError
// ---------------------------------------------------------------------------

/// Top-level error type for a bike-fit analysis run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FitError {
    /// Angle math on a degenerate segment. Local to one angle of one frame.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Fewer usable frames than the minimum required for aggregation.
    #[error("Insufficient data: need at least {required} usable frames, found {available}")]
    InsufficientData {
        /// Minimum number of usable frames.
        required: usize,
        /// Number of usable frames actually found.
        available: usize,
    },

    /// Riding style identifier outside the supported set.
    #[error("Unknown riding style: '{style}'")]
    UnknownStyle {
        /// The rejected identifier.
        style: String,
    },

    /// Invalid range profile or analysis configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Every area was excluded from scoring.
    #[error("No scoreable areas: no profiled angle had measurements and a positive weight")]
    NoScoreableAreas,

    /// The caller signalled cancellation.
    #[error("Analysis cancelled during {stage}")]
    Cancelled {
        /// Stage at which cancellation was observed.
        stage: AnalysisStage,
    },

    /// Input data failed validation.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed.
        message: String,
    },
}

impl FitError {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new unknown-style error.
    #[must_use]
    pub fn unknown_style(style: impl Into<String>) -> Self {
        Self::UnknownStyle {
            style: style.into(),
        }
    }

    /// Returns `true` if this error ends the whole analysis run.
    ///
    /// Geometry errors are absorbed per angle and never abort a run.
    #[must_use]
    pub fn aborts_run(&self) -> bool {
        !matches!(self, Self::Geometry(_))
    }

    /// Message suitable for showing to the rider.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientData { .. } => {
                "Could not compute angles. Ensure the video shows a clear side view \
                 with your full body visible while pedaling."
                    .to_string()
            }
            Self::NoScoreableAreas => {
                "None of the angles this riding style scores could be measured. \
                 Check that the selected body side faces the camera."
                    .to_string()
            }
            Self::UnknownStyle { style } => {
                format!("'{style}' is not a supported riding style.")
            }
            Self::Configuration(e) => format!("The fit range configuration is invalid: {e}"),
            Self::Cancelled { .. } => "Analysis was cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// GeometryError
// ---------------------------------------------------------------------------

/// Errors from the angle primitives.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A ray or segment is too short to define a direction.
    #[error("Degenerate geometry: segment length {length:.3e} is below tolerance")]
    DegenerateGeometry {
        /// Length of the offending segment.
        length: f64,
    },

    /// A coordinate was NaN or infinite.
    #[error("Non-finite coordinate in angle input")]
    NonFinite,
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced when loading or validating configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Field name or dotted path.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// An ideal range whose maximum does not exceed its minimum.
    #[error("Invalid range for {style}.{angle}: max ({max}) must be greater than min ({min})")]
    InvalidRange {
        /// Riding style key.
        style: String,
        /// Angle key.
        angle: String,
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },

    /// A negative scoring weight.
    #[error("Invalid weight for {style}.{angle}: {weight} is negative")]
    NegativeWeight {
        /// Riding style key.
        style: String,
        /// Angle key.
        angle: String,
        /// Configured weight.
        weight: f64,
    },

    /// A supported riding style has no profile in the table.
    #[error("Profile table has no entry for riding style '{style}'")]
    MissingStyle {
        /// The missing style id.
        style: String,
    },

    /// A configuration file could not be read.
    #[error("Failed to read configuration file {path:?}: {source}")]
    FileRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file or its directory could not be written.
    #[error("Failed to write configuration file {path:?}: {source}")]
    FileWrite {
        /// Path that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration could not be serialized.
    #[error("Failed to serialize configuration: {source}")]
    Serialize {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A configuration document could not be parsed.
    #[error("Failed to parse configuration: {source}")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct an [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_does_not_abort_run() {
        let err: FitError = GeometryError::DegenerateGeometry { length: 0.0 }.into();
        assert!(!err.aborts_run());
    }

    #[test]
    fn test_whole_run_failures_abort() {
        assert!(FitError::NoScoreableAreas.aborts_run());
        assert!(FitError::unknown_style("bmx").aborts_run());
        assert!(FitError::InsufficientData {
            required: 3,
            available: 2
        }
        .aborts_run());
    }

    #[test]
    fn test_config_error_converts() {
        let err: FitError = ConfigError::invalid_value("smoothing_window", "must be >= 1").into();
        assert!(matches!(err, FitError::Configuration(_)));
        assert!(err.to_string().contains("smoothing_window"));
    }

    #[test]
    fn test_user_message_for_insufficient_data() {
        let err = FitError::InsufficientData {
            required: 3,
            available: 0,
        };
        assert!(err.user_message().contains("side view"));
    }

    #[test]
    fn test_user_message_for_no_scoreable_areas() {
        let msg = FitError::NoScoreableAreas.user_message();
        assert!(msg.contains("riding style"));
        assert_ne!(
            msg,
            FitError::InsufficientData {
                required: 3,
                available: 0
            }
            .user_message()
        );
    }
}
