//! # Cropcast Model
//!
//! Inference pipeline for the crop yield regressor.
//!
//! ## Pipeline
//!
//! ```text
//! yield_df.csv ──> Vocabularies (region, crop)
//!                      │
//! PredictionRequest ───┴──> FeatureVector[6]
//!                              │
//!                              ├──> Scaler (scaler.json)
//!                              │
//!                              └──> Regressor (model.json) ──> f64
//! ```
//!
//! Everything is loaded once into an immutable [`ModelContext`]; request
//! handling only reads it.
//!
//! ## Example
//!
//! ```no_run
//! use cropcast_model::{initialize, ArtifactPaths, PredictionRequest, StartupPolicy};
//!
//! fn main() -> anyhow::Result<()> {
//!     let ctx = initialize(&ArtifactPaths::from_model_dir("model"), StartupPolicy::Degraded)?;
//!     let estimate = ctx.predict(&PredictionRequest {
//!         region: "India".to_string(),
//!         crop: "Maize".to_string(),
//!         year: 2020,
//!         rainfall: 1200.0,
//!         pesticide_use: 50.0,
//!         avg_temperature: 22.5,
//!     })?;
//!     println!("{estimate:.1} hg/ha");
//!     Ok(())
//! }
//! ```

pub mod artifacts;
mod context;
mod dataset;
mod error;
mod features;
mod paths;
mod readiness;
mod startup;
mod vocabulary;

pub use artifacts::{Regressor, RegressorArtifact, Scaler, ScalerArtifact};
pub use context::{CategoryOptions, ModelContext};
pub use dataset::{ReferenceDataset, CROP_COLUMN, REGION_COLUMN};
pub use error::{
    ArtifactError, DatasetError, EncodeError, ExecutionError, PredictError, Result, StartupError,
};
pub use features::{
    encode, FeatureVector, PredictionRequest, RawPredictionRequest, FEATURE_COUNT, FEATURE_NAMES,
};
pub use paths::{resolve_model_dir, ArtifactPaths, DEFAULT_MODEL_DIR, MODEL_DIR_ENV};
pub use readiness::{Component, LoadIssue, ReadinessReport};
pub use startup::{initialize, shared_context, StartupPolicy};
pub use vocabulary::{CategoryVocabulary, Vocabularies};
