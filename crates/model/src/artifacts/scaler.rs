use super::{ensure_dimension, Scaler};
use crate::error::ExecutionError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Serialized scaler state (`scaler.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// Standardization: `(x - mean) / scale`.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Pass-through, for models trained on raw features.
    Identity,
}

impl ScalerArtifact {
    pub(crate) fn validate(&self, dimension: usize) -> Result<(), String> {
        let Self::Standard { mean, scale } = self else {
            return Ok(());
        };
        if mean.len() != dimension || scale.len() != dimension {
            return Err(format!(
                "expected {dimension} mean/scale entries, got {}/{}",
                mean.len(),
                scale.len()
            ));
        }
        if mean.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err("mean/scale must be finite".to_string());
        }
        Ok(())
    }
}

impl Scaler for ScalerArtifact {
    fn transform(&self, raw: ArrayView1<'_, f64>) -> Result<Array1<f64>, ExecutionError> {
        let scaled = match self {
            Self::Identity => raw.to_owned(),
            Self::Standard { mean, scale } => {
                ensure_dimension(mean.len(), raw.len())?;
                ensure_dimension(scale.len(), raw.len())?;
                // Constant training features carry scale 0; treat them as unit scale.
                let scale = Array1::from_iter(
                    scale
                        .iter()
                        .map(|&s| if s == 0.0 { 1.0 } else { s }),
                );
                let mean = ArrayView1::from(mean.as_slice());
                (&raw - &mean) / &scale
            }
        };
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(ExecutionError::NonFinite { stage: "scaler" });
        }
        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn standard() -> ScalerArtifact {
        ScalerArtifact::Standard {
            mean: vec![1.0, 1.0, 2000.0, 1000.0, 40.0, 20.0],
            scale: vec![1.0, 0.5, 10.0, 100.0, 0.0, 2.5],
        }
    }

    #[test]
    fn standardizes_each_feature() {
        let raw = array![1.0, 1.0, 2020.0, 1200.0, 50.0, 22.5];
        let scaled = standard().transform(raw.view()).unwrap();
        assert_eq!(scaled, array![0.0, 0.0, 2.0, 2.0, 10.0, 1.0]);
    }

    #[test]
    fn short_scale_is_a_dimension_error() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![0.0; 6],
            scale: vec![1.0; 5],
        };
        let raw = array![1.0, 1.0, 2020.0, 1200.0, 50.0, 22.5];
        assert_eq!(
            scaler.transform(raw.view()).unwrap_err(),
            ExecutionError::DimensionMismatch {
                expected: 5,
                actual: 6
            }
        );
    }

    #[test]
    fn rejects_wrong_shape_at_transform_time() {
        let raw = array![1.0, 2.0];
        let err = standard().transform(raw.view()).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::DimensionMismatch {
                expected: 6,
                actual: 2
            }
        );
    }

    #[test]
    fn overflow_is_an_execution_error() {
        let raw = array![f64::MAX, 0.0, 0.0, 0.0, 0.0, 0.0];
        let scaler = ScalerArtifact::Standard {
            mean: vec![-f64::MAX, 0.0, 0.0, 0.0, 0.0, 0.0],
            scale: vec![1.0; 6],
        };
        let err = scaler.transform(raw.view()).unwrap_err();
        assert_eq!(err, ExecutionError::NonFinite { stage: "scaler" });
    }

    #[test]
    fn parses_tagged_json() {
        let scaler: ScalerArtifact = serde_json::from_str(r#"{"kind":"identity"}"#).unwrap();
        assert_eq!(scaler, ScalerArtifact::Identity);
        assert!(standard().validate(6).is_ok());
        assert!(standard().validate(5).is_err());
    }
}
