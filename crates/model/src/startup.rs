use crate::artifacts::{load_regressor, load_scaler, Regressor, Scaler};
use crate::context::ModelContext;
use crate::dataset::ReferenceDataset;
use crate::error::StartupError;
use crate::features::FEATURE_COUNT;
use crate::paths::ArtifactPaths;
use crate::readiness::{Component, LoadIssue};
use crate::vocabulary::Vocabularies;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

/// What to do when the dataset or an artifact fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupPolicy {
    /// Log the failure and keep serving with whatever loaded.
    #[default]
    Degraded,
    /// Refuse to build a context unless everything loaded.
    Strict,
}

static SHARED_CONTEXT: OnceCell<Arc<ModelContext>> = OnceCell::new();

/// Process-wide context; only the first successful call loads from disk.
pub fn shared_context(
    paths: &ArtifactPaths,
    policy: StartupPolicy,
) -> Result<Arc<ModelContext>, StartupError> {
    SHARED_CONTEXT
        .get_or_try_init(|| initialize(paths, policy).map(Arc::new))
        .cloned()
}

/// Build vocabularies and load artifacts from `paths`.
pub fn initialize(
    paths: &ArtifactPaths,
    policy: StartupPolicy,
) -> Result<ModelContext, StartupError> {
    log::info!("Model initialization start");
    log::info!("Model dir: {}", paths.model_dir.display());
    log::info!("Reference dataset: {}", paths.dataset.display());

    let mut issues = Vec::new();

    let vocabularies = match ReferenceDataset::load(&paths.dataset) {
        Ok(dataset) => {
            let vocabularies = Vocabularies::from_dataset(&dataset);
            log::info!(
                "Initialized {} regions and {} crops",
                vocabularies.region.len(),
                vocabularies.crop.len()
            );
            vocabularies
        }
        Err(err) => {
            log::error!("{err}");
            if let Some(listing) = describe_dir(&paths.model_dir) {
                log::error!("Model dir exists, contents: {listing}");
            }
            issues.push(LoadIssue::new(Component::Dataset, err.to_string()));
            Vocabularies::default()
        }
    };

    let scaler: Option<Arc<dyn Scaler>> = match load_scaler(&paths.scaler, FEATURE_COUNT) {
        Ok(scaler) => {
            log::info!("Scaler loaded from {}", paths.scaler.display());
            Some(Arc::new(scaler))
        }
        Err(err) => {
            log::error!("{err}");
            issues.push(LoadIssue::new(Component::Scaler, err.to_string()));
            None
        }
    };

    let regressor: Option<Arc<dyn Regressor>> = match load_regressor(&paths.model, FEATURE_COUNT) {
        Ok(model) => {
            log::info!("Model loaded from {}", paths.model.display());
            Some(Arc::new(model))
        }
        Err(err) => {
            log::error!("{err}");
            issues.push(LoadIssue::new(Component::Model, err.to_string()));
            None
        }
    };

    if scaler.is_none() || regressor.is_none() {
        log::error!("Predictions are disabled until the service restarts with valid artifacts");
    }

    if policy == StartupPolicy::Strict && !issues.is_empty() {
        return Err(StartupError {
            issues: issues.iter().map(ToString::to_string).collect(),
        });
    }

    log::info!("Model initialization complete");
    Ok(ModelContext::new(vocabularies, scaler, regressor).with_issues(issues))
}

fn describe_dir(dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Some(format!("[{}]", names.join(", ")))
}
