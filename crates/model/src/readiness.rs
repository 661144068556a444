use serde::{Deserialize, Serialize};

/// Which part of the model state failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Dataset,
    Scaler,
    Model,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Scaler => "scaler",
            Self::Model => "model",
        }
    }
}

/// A load failure recorded during startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadIssue {
    pub component: Component,
    pub message: String,
}

impl LoadIssue {
    pub fn new(component: Component, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.component.as_str(), self.message)
    }
}

/// Snapshot served by the health endpoint and the `doctor` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub scaler_loaded: bool,
    pub model_loaded: bool,
    pub regions: usize,
    pub crops: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<LoadIssue>,
}
