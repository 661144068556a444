use std::path::{Path, PathBuf};

pub const MODEL_DIR_ENV: &str = "CROPCAST_MODEL_DIR";
pub const DEFAULT_MODEL_DIR: &str = "model";

pub const DATASET_FILE_NAME: &str = "yield_df.csv";
pub const MODEL_FILE_NAME: &str = "model.json";
pub const SCALER_FILE_NAME: &str = "scaler.json";

/// Fixed locations of the reference dataset and trained artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model_dir: PathBuf,
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    #[must_use]
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model_dir: dir.to_path_buf(),
            dataset: dir.join(DATASET_FILE_NAME),
            model: dir.join(MODEL_FILE_NAME),
            scaler: dir.join(SCALER_FILE_NAME),
        }
    }
}

/// Explicit override, then `CROPCAST_MODEL_DIR`, then `./model`.
#[must_use]
pub fn resolve_model_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    PathBuf::from(DEFAULT_MODEL_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_relative_to_model_dir() {
        let paths = ArtifactPaths::from_model_dir("/srv/yield/model");
        assert_eq!(paths.dataset, Path::new("/srv/yield/model/yield_df.csv"));
        assert_eq!(paths.model, Path::new("/srv/yield/model/model.json"));
        assert_eq!(paths.scaler, Path::new("/srv/yield/model/scaler.json"));
    }

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_model_dir(Some(Path::new("custom")));
        assert_eq!(dir, PathBuf::from("custom"));
    }
}
