use crate::artifacts::{Regressor, Scaler};
use crate::error::{EncodeError, PredictError, Result};
use crate::features::{encode, FeatureVector, PredictionRequest, RawPredictionRequest};
use crate::readiness::{LoadIssue, ReadinessReport};
use crate::vocabulary::Vocabularies;
use serde::Serialize;
use std::sync::Arc;

/// Known category labels, in vocabulary index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryOptions {
    pub regions: Vec<String>,
    pub crops: Vec<String>,
}

/// Read-only inference state assembled once at startup.
///
/// Either artifact may be absent after a failed load; prediction then fails
/// with [`PredictError::ModelUnavailable`] while [`ModelContext::options`]
/// keeps serving whatever vocabularies were built.
#[derive(Debug, Clone, Default)]
pub struct ModelContext {
    vocabularies: Vocabularies,
    scaler: Option<Arc<dyn Scaler>>,
    regressor: Option<Arc<dyn Regressor>>,
    issues: Vec<LoadIssue>,
}

impl ModelContext {
    pub fn new(
        vocabularies: Vocabularies,
        scaler: Option<Arc<dyn Scaler>>,
        regressor: Option<Arc<dyn Regressor>>,
    ) -> Self {
        Self {
            vocabularies,
            scaler,
            regressor,
            issues: Vec::new(),
        }
    }

    pub(crate) fn with_issues(mut self, issues: Vec<LoadIssue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn vocabularies(&self) -> &Vocabularies {
        &self.vocabularies
    }

    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    pub fn is_ready(&self) -> bool {
        self.scaler.is_some() && self.regressor.is_some()
    }

    pub fn options(&self) -> CategoryOptions {
        CategoryOptions {
            regions: self.vocabularies.region.labels().to_vec(),
            crops: self.vocabularies.crop.labels().to_vec(),
        }
    }

    pub fn encode(
        &self,
        request: &PredictionRequest,
    ) -> std::result::Result<FeatureVector, EncodeError> {
        encode(&self.vocabularies, request)
    }

    /// Encode, scale and evaluate a single request.
    pub fn predict(&self, request: &PredictionRequest) -> Result<f64> {
        let (Some(scaler), Some(regressor)) = (&self.scaler, &self.regressor) else {
            return Err(PredictError::ModelUnavailable);
        };
        let features = self.encode(request)?;
        let raw = features.to_array();
        let normalized = scaler.transform(raw.view())?;
        let estimate = regressor.predict(normalized.view())?;
        log::debug!(
            "Predicted {estimate:.3} for {}/{} ({})",
            request.region,
            request.crop,
            request.year
        );
        Ok(estimate)
    }

    /// Same as [`ModelContext::predict`] for payloads with untyped numeric fields.
    pub fn predict_raw(&self, request: RawPredictionRequest) -> Result<f64> {
        if !self.is_ready() {
            return Err(PredictError::ModelUnavailable);
        }
        let request = request.coerce()?;
        self.predict(&request)
    }

    pub fn status(&self) -> ReadinessReport {
        ReadinessReport {
            ready: self.is_ready(),
            scaler_loaded: self.scaler.is_some(),
            model_loaded: self.regressor.is_some(),
            regions: self.vocabularies.region.len(),
            crops: self.vocabularies.crop.len(),
            issues: self.issues.clone(),
        }
    }
}
