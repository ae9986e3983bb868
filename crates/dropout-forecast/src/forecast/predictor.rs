//! Seam to the regression model.
//!
//! The forecasting core only needs `fit(X, y) -> model` and
//! `model.predict(x) -> rate`; [`RidgeTrainer`] is a deterministic baseline
//! implementation so the service can be trained and run end to end.

use crate::features::{FeatureName, FeatureVector, Record, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("cannot fit a model without training rows")]
    EmptyTrainingSet,
    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },
    #[error("normal equations are singular")]
    Singular,
}

/// A fitted model that scores feature vectors.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> f64;

    fn predict_batch(&self, rows: &[FeatureVector]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Produces a fitted model from a training set. Same input, same model.
pub trait RegressorTrainer {
    type Model: Regressor;

    fn fit(&self, training: &TrainingSet) -> Result<Self::Model, PredictorError>;
}

/// Paired feature rows and dropout targets.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    features: Vec<FeatureVector>,
    targets: Vec<f64>,
}

impl TrainingSet {
    pub fn new(features: Vec<FeatureVector>, targets: Vec<f64>) -> Result<Self, PredictorError> {
        if features.len() != targets.len() {
            return Err(PredictorError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        Ok(Self { features, targets })
    }

    /// Uses the training convention (real prior-year lags). Rows lacking the
    /// target or any feature value are skipped.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut set = Self::default();
        let mut skipped = 0usize;
        for record in records {
            match (record.training_features(), record.dropout_rate) {
                (Some(features), Some(target)) => {
                    set.features.push(features);
                    set.targets.push(target);
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "training rows with incomplete features skipped");
        }
        set
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }
}

/// Ridge regression over standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegressor {
    intercept: f64,
    weights: [f64; FEATURE_COUNT],
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
}

impl RidgeRegressor {
    /// Standardized coefficient per feature.
    pub fn coefficients(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ordered()
            .into_iter()
            .zip(self.weights.iter().copied())
    }

    /// Share of total absolute standardized weight carried by each feature,
    /// largest first.
    pub fn feature_importance(&self) -> Vec<(FeatureName, f64)> {
        let total: f64 = self.weights.iter().map(|weight| weight.abs()).sum();
        let mut shares: Vec<(FeatureName, f64)> = self
            .coefficients()
            .map(|(name, weight)| {
                let share = if total > 0.0 { weight.abs() / total } else { 0.0 };
                (name, share)
            })
            .collect();
        shares.sort_by(|a, b| b.1.total_cmp(&a.1));
        shares
    }
}

impl Regressor for RidgeRegressor {
    fn predict(&self, features: &FeatureVector) -> f64 {
        features
            .as_slice()
            .iter()
            .enumerate()
            .map(|(j, &value)| self.weights[j] * (value - self.means[j]) / self.scales[j])
            .sum::<f64>()
            + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeTrainer {
    /// L2 penalty on standardized weights; zero gives ordinary least squares.
    pub penalty: f64,
}

impl Default for RidgeTrainer {
    fn default() -> Self {
        Self { penalty: 1.0 }
    }
}

impl RegressorTrainer for RidgeTrainer {
    type Model = RidgeRegressor;

    fn fit(&self, training: &TrainingSet) -> Result<RidgeRegressor, PredictorError> {
        if training.is_empty() {
            return Err(PredictorError::EmptyTrainingSet);
        }

        let n = training.len() as f64;
        let rows = training.features();
        let targets = training.targets();

        let mut means = [0.0; FEATURE_COUNT];
        for row in rows {
            for (j, value) in row.as_slice().iter().enumerate() {
                means[j] += value / n;
            }
        }

        let mut scales = [0.0; FEATURE_COUNT];
        for row in rows {
            for (j, value) in row.as_slice().iter().enumerate() {
                scales[j] += (value - means[j]).powi(2) / n;
            }
        }
        for scale in scales.iter_mut() {
            *scale = if *scale > 1e-12 { scale.sqrt() } else { 1.0 };
        }

        let intercept = targets.iter().sum::<f64>() / n;

        // Normal equations (ZᵀZ + λI) w = Zᵀ(y - ȳ) on standardized Z.
        let mut gram = [[0.0; FEATURE_COUNT]; FEATURE_COUNT];
        let mut moment = [0.0; FEATURE_COUNT];
        for (row, target) in rows.iter().zip(targets) {
            let mut z = [0.0; FEATURE_COUNT];
            for (j, value) in row.as_slice().iter().enumerate() {
                z[j] = (value - means[j]) / scales[j];
            }
            for a in 0..FEATURE_COUNT {
                moment[a] += z[a] * (target - intercept);
                for b in 0..FEATURE_COUNT {
                    gram[a][b] += z[a] * z[b];
                }
            }
        }
        for (a, row) in gram.iter_mut().enumerate() {
            row[a] += self.penalty;
        }

        let weights = solve(gram, moment)?;
        info!(rows = training.len(), penalty = self.penalty, "ridge regressor fitted");

        Ok(RidgeRegressor {
            intercept,
            weights,
            means,
            scales,
        })
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(
    mut matrix: [[f64; FEATURE_COUNT]; FEATURE_COUNT],
    mut rhs: [f64; FEATURE_COUNT],
) -> Result<[f64; FEATURE_COUNT], PredictorError> {
    for col in 0..FEATURE_COUNT {
        let pivot = (col..FEATURE_COUNT)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-12 {
            return Err(PredictorError::Singular);
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..FEATURE_COUNT {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..FEATURE_COUNT {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = [0.0; FEATURE_COUNT];
    for row in (0..FEATURE_COUNT).rev() {
        let tail: f64 = (row + 1..FEATURE_COUNT)
            .map(|k| matrix[row][k] * solution[k])
            .sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(gap: f64, repetition: f64) -> FeatureVector {
        FeatureVector::from_fn(|name| match name {
            FeatureName::OverAgeGap => gap,
            FeatureName::RepetitionLag => repetition,
            FeatureName::DepartmentCode => 76.0,
            _ => 1.0,
        })
    }

    fn linear_training_set() -> TrainingSet {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for gap in 0..6 {
            for repetition in 0..4 {
                let (gap, repetition) = (gap as f64, repetition as f64);
                features.push(vector(gap, repetition));
                targets.push(1.0 + 0.5 * gap + 2.0 * repetition);
            }
        }
        TrainingSet::new(features, targets).expect("aligned")
    }

    #[test]
    fn least_squares_recovers_a_linear_relationship() {
        let model = RidgeTrainer { penalty: 0.0 }
            .fit(&linear_training_set())
            .expect_err("constant columns make plain least squares singular");
        assert!(matches!(model, PredictorError::Singular));

        let model = RidgeTrainer { penalty: 1e-9 }
            .fit(&linear_training_set())
            .expect("fits");
        let predicted = model.predict(&vector(10.0, 3.0));
        assert!((predicted - 12.0).abs() < 1e-4, "predicted {predicted}");
    }

    #[test]
    fn fitting_is_deterministic() {
        let training = linear_training_set();
        let first = RidgeTrainer::default().fit(&training).expect("fits");
        let second = RidgeTrainer::default().fit(&training).expect("fits");
        assert_eq!(first, second);
    }

    #[test]
    fn penalty_shrinks_towards_the_mean() {
        let training = linear_training_set();
        let heavy = RidgeTrainer { penalty: 1e9 }.fit(&training).expect("fits");
        let mean = training.targets().iter().sum::<f64>() / training.len() as f64;
        assert!((heavy.predict(&vector(5.0, 3.0)) - mean).abs() < 1e-3);
    }

    #[test]
    fn importance_ranks_the_stronger_driver_first() {
        let model = RidgeTrainer { penalty: 1e-6 }
            .fit(&linear_training_set())
            .expect("fits");
        let importance = model.feature_importance();
        assert_eq!(importance[0].0, FeatureName::RepetitionLag);
        let total: f64 = importance.iter().map(|(_, share)| share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_or_misaligned_sets_are_rejected() {
        let error = RidgeTrainer::default()
            .fit(&TrainingSet::default())
            .expect_err("empty");
        assert!(matches!(error, PredictorError::EmptyTrainingSet));

        let error = TrainingSet::new(vec![vector(1.0, 1.0)], vec![]).expect_err("mismatch");
        assert!(matches!(
            error,
            PredictorError::LengthMismatch { features: 1, targets: 0 }
        ));
    }

    #[test]
    fn batch_prediction_matches_single_rows() {
        let model = RidgeTrainer::default().fit(&linear_training_set()).expect("fits");
        let rows = vec![vector(1.0, 2.0), vector(3.0, 0.0)];
        let batch = model.predict_batch(&rows);
        assert_eq!(batch, vec![model.predict(&rows[0]), model.predict(&rows[1])]);
    }
}
