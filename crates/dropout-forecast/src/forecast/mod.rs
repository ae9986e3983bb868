//! Scenario forecasting: resolve a municipality, compose its model input and
//! score it with a fitted regressor.

mod artifact;
mod predictor;
mod resolver;
mod scenario;
mod service;

use crate::features::FeatureName;

pub use artifact::{canonical_predictors, ArtifactError, ModelArtifact};
pub use predictor::{
    PredictorError, Regressor, RegressorTrainer, RidgeRegressor, RidgeTrainer, TrainingSet,
};
pub use resolver::EntityResolver;
pub use scenario::{Overrides, ScenarioComposer};
pub use service::{
    DepartmentMunicipalities, FeatureSnapshot, FeatureSummary, ForecastService, HealthView,
    Prediction,
};

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("municipality '{query}' not found")]
    NotFound { query: String },
    #[error("no trained model is loaded")]
    ModelUnavailable,
    #[error("{entity} has no value for feature {feature}")]
    MissingFeature { entity: String, feature: FeatureName },
    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

impl ForecastError {
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }
}
