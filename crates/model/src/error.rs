use std::path::PathBuf;
use thiserror::Error;

/// Result type for prediction calls
pub type Result<T> = std::result::Result<T, PredictError>;

/// Failures while turning a request into a feature vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Label is not part of the trained vocabulary
    #[error("Unknown {field}: {value}")]
    UnknownCategory { field: &'static str, value: String },

    /// Numeric input could not be read as a finite number
    #[error("Invalid numeric value for field: {field}")]
    InvalidNumericField { field: &'static str },
}

/// Failures raised inside the scaler or regressor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite value produced by {stage}")]
    NonFinite { stage: &'static str },

    #[error("Malformed tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },
}

/// Everything `ModelContext::predict` can fail with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Encoding(#[from] EncodeError),

    /// Scaler or model was never loaded; not caused by the request.
    #[error("Model not loaded properly")]
    ModelUnavailable,

    #[error("Model execution failed: {0}")]
    ModelExecution(#[from] ExecutionError),
}

impl PredictError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Encoding(EncodeError::UnknownCategory { .. }) => "unknown_category",
            Self::Encoding(EncodeError::InvalidNumericField { .. }) => "invalid_numeric_field",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelExecution(_) => "model_execution_error",
        }
    }

    /// `true` for the readiness failure that the caller must not blame on the client.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable)
    }
}

/// Failures while reading the reference dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Reference dataset not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Failed to read reference dataset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference dataset is missing column: {column}")]
    MissingColumn { column: &'static str },

    #[error("Malformed CSV at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Failures while loading a trained artifact
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Failed to read artifact {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize artifact {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ArtifactError {
    pub fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Raised only under the strict startup policy.
#[derive(Error, Debug)]
#[error("Refusing to start with incomplete model state: {}", issues.join("; "))]
pub struct StartupError {
    pub issues: Vec<String>,
}
