//! Error types and exit codes for skillbench
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args/config values)
//! - 3: Data error (invalid suite, test definition or skill path)
//! - 130: Interrupted
//!
//! Agent execution failures are not errors: they are reported as data on
//! `ExecutionResult` so one failing test never aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data error - invalid suite or skill (3)
    Data = 3,
    /// Interrupted by the user (130)
    Interrupted = 130,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during benchmark operations
#[derive(Error, Debug)]
pub enum BenchError {
    // Usage errors (exit code 2)
    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    #[error("unsupported {context}: {value} (supported: {supported})")]
    Unsupported {
        context: String,
        value: String,
        supported: String,
    },

    // Data errors (exit code 3)
    #[error("invalid test definition {name:?}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("invalid test suite {path:?}: {reason}")]
    InvalidSuite { path: PathBuf, reason: String },

    #[error("skill not found: {path:?}")]
    SkillNotFound { path: PathBuf },

    #[error("no tests to run")]
    NoTests,

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to {operation}: {reason}")]
    FailedOperation { operation: String, reason: String },

    #[error("benchmark run cancelled")]
    Cancelled,
}

impl BenchError {
    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        BenchError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an unsupported value
    pub fn unsupported(
        context: &str,
        value: impl std::fmt::Display,
        supported: impl std::fmt::Display,
    ) -> Self {
        BenchError::Unsupported {
            context: context.to_string(),
            value: value.to_string(),
            supported: supported.to_string(),
        }
    }

    /// Create an error for a test definition that failed validation
    pub fn invalid_definition(name: &str, reason: impl std::fmt::Display) -> Self {
        BenchError::InvalidDefinition {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error for a failed operation
    pub fn failed(operation: &str, error: impl std::fmt::Display) -> Self {
        BenchError::FailedOperation {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            BenchError::InvalidValue { .. }
            | BenchError::Unsupported { .. } => ExitCode::Usage,

            BenchError::InvalidDefinition { .. }
            | BenchError::InvalidSuite { .. }
            | BenchError::SkillNotFound { .. }
            | BenchError::NoTests => ExitCode::Data,

            BenchError::Io(_)
            | BenchError::Json(_)
            | BenchError::Toml(_)
            | BenchError::FailedOperation { .. } => ExitCode::Failure,

            BenchError::Cancelled => ExitCode::Interrupted,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            BenchError::InvalidValue { .. } => "invalid_value",
            BenchError::Unsupported { .. } => "unsupported",
            BenchError::InvalidDefinition { .. } => "invalid_definition",
            BenchError::InvalidSuite { .. } => "invalid_suite",
            BenchError::SkillNotFound { .. } => "skill_not_found",
            BenchError::NoTests => "no_tests",
            BenchError::Io(_) => "io_error",
            BenchError::Json(_) => "json_error",
            BenchError::Toml(_) => "toml_error",
            BenchError::FailedOperation { .. } => "failed_operation",
            BenchError::Cancelled => "cancelled",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for skillbench operations
pub type Result<T> = std::result::Result<T, BenchError>;
