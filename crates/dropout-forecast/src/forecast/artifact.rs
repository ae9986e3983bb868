use super::predictor::{PredictorError, RegressorTrainer, RidgeRegressor, RidgeTrainer, TrainingSet};
use crate::dataset::RawRecord;
use crate::features::{FeatureEngineer, FeatureName, HistoricalTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to access model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model artifact was trained on features {found:?}, expected {expected:?}")]
    PredictorMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },
    #[error("model artifact history is not ordered by municipality and year")]
    UnorderedHistory,
    #[error(transparent)]
    Training(#[from] PredictorError),
}

/// Fitted model persisted together with the table it was trained from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: RidgeRegressor,
    pub predictors: Vec<String>,
    pub history: HistoricalTable,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
}

pub fn canonical_predictors() -> Vec<String> {
    FeatureName::ordered()
        .into_iter()
        .map(|name| name.key().to_string())
        .collect()
}

impl ModelArtifact {
    /// Prepares the raw table and fits the trainer on its trainable subset.
    pub fn train(
        engineer: &FeatureEngineer,
        trainer: &RidgeTrainer,
        raw: &[RawRecord],
    ) -> Result<Self, ArtifactError> {
        let prepared = engineer.prepare(raw);
        let training = TrainingSet::from_records(&prepared.trainable);
        info!(rows = training.len(), "training dropout model");
        let model = trainer.fit(&training)?;

        Ok(Self {
            model,
            predictors: canonical_predictors(),
            history: prepared.history,
            trained_at: Utc::now(),
            training_rows: training.len(),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush().map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "model artifact saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            rows = artifact.history.len(),
            trained_at = %artifact.trained_at,
            "model artifact loaded"
        );
        Ok(artifact)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), ArtifactError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Decodes and validates; nothing is returned unless the whole artifact
    /// is usable.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_reader(reader)?;
        let expected = canonical_predictors();
        if artifact.predictors != expected {
            return Err(ArtifactError::PredictorMismatch {
                found: artifact.predictors,
                expected,
            });
        }
        if !artifact.history.is_canonically_ordered() {
            return Err(ArtifactError::UnorderedHistory);
        }
        Ok(artifact)
    }
}
