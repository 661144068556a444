//! Trained artifacts consumed by the prediction pipeline.
//!
//! The pipeline only depends on the two capability traits below. The JSON
//! formats in [`scaler`] and [`regressor`] are the on-disk encodings the
//! export tooling writes; anything implementing the traits can be plugged
//! into a [`crate::ModelContext`].

mod regressor;
mod scaler;

pub use regressor::{Aggregation, RegressorArtifact, TreeModel, TreeNode};
pub use scaler::ScalerArtifact;

use crate::error::{ArtifactError, ExecutionError};
use ndarray::{Array1, ArrayView1};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;

/// Numeric normalization fitted on the training data.
pub trait Scaler: Debug + Send + Sync {
    fn transform(&self, raw: ArrayView1<'_, f64>) -> Result<Array1<f64>, ExecutionError>;
}

/// Regression model mapping a normalized feature vector to a yield estimate.
pub trait Regressor: Debug + Send + Sync {
    fn predict(&self, normalized: ArrayView1<'_, f64>) -> Result<f64, ExecutionError>;
}

pub(crate) fn ensure_dimension(expected: usize, actual: usize) -> Result<(), ExecutionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ExecutionError::DimensionMismatch { expected, actual })
    }
}

fn read_json_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_scaler(path: &Path, dimension: usize) -> Result<ScalerArtifact, ArtifactError> {
    let scaler: ScalerArtifact = read_json_artifact(path)?;
    scaler
        .validate(dimension)
        .map_err(|reason| ArtifactError::invalid(path, reason))?;
    Ok(scaler)
}

pub fn load_regressor(path: &Path, dimension: usize) -> Result<RegressorArtifact, ArtifactError> {
    let model: RegressorArtifact = read_json_artifact(path)?;
    model
        .validate(dimension)
        .map_err(|reason| ArtifactError::invalid(path, reason))?;
    Ok(model)
}
