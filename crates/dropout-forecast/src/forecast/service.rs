use super::artifact::ModelArtifact;
use super::resolver::EntityResolver;
use super::scenario::{Overrides, ScenarioComposer};
use super::predictor::Regressor;
use super::ForecastError;
use crate::analytics::department_name;
use crate::features::{FeatureName, FeatureVector, HistoricalTable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, instrument};

/// Scored scenario for one municipality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub entity_name: String,
    pub predicted_rate: f64,
    pub predicted_students_impacted: u64,
    pub target_year: i32,
    pub features: FeatureVector,
    pub department_code: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub name: &'static str,
    pub description: &'static str,
    pub current_value: Option<f64>,
    pub unit: &'static str,
}

/// Latest observed feature values for a municipality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSnapshot {
    pub entity_name: String,
    pub department_code: i64,
    pub latest_year: i32,
    pub features: Vec<FeatureSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentMunicipalities {
    pub code: i64,
    pub name: String,
    pub municipalities: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub model_loaded: bool,
    pub total_municipalities: usize,
    pub model_features: Vec<&'static str>,
}

/// Read-only forecasting surface over the shared historical table.
#[derive(Clone)]
pub struct ForecastService {
    table: Arc<HistoricalTable>,
    model: Option<Arc<dyn Regressor>>,
}

impl std::fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastService")
            .field("rows", &self.table.len())
            .field("model_loaded", &self.model.is_some())
            .finish()
    }
}

impl ForecastService {
    pub fn new(table: Arc<HistoricalTable>, model: Option<Arc<dyn Regressor>>) -> Self {
        Self { table, model }
    }

    /// Splits a loaded artifact into the shared table and its model.
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        let ModelArtifact { model, history, .. } = artifact;
        Self::new(Arc::new(history), Some(Arc::new(model)))
    }

    pub fn table(&self) -> Arc<HistoricalTable> {
        Arc::clone(&self.table)
    }

    #[instrument(skip(self, overrides), fields(adjustments = overrides.len()))]
    pub fn predict(
        &self,
        entity_name: &str,
        target_year: i32,
        overrides: &Overrides,
    ) -> Result<Prediction, ForecastError> {
        let model = self.model.as_ref().ok_or(ForecastError::ModelUnavailable)?;
        let record = EntityResolver::new(&self.table).resolve(entity_name)?;
        let features = ScenarioComposer::compose(record, overrides)?;
        let predicted_rate = model.predict(&features);

        let population = features.get(FeatureName::Population);
        let impacted = (predicted_rate / 100.0 * population).round();
        let predicted_students_impacted = if impacted.is_finite() && impacted > 0.0 {
            impacted as u64
        } else {
            0
        };

        info!(
            entity = record.entity_name.as_str(),
            predicted_rate, target_year, "dropout forecast computed"
        );

        Ok(Prediction {
            entity_name: record.entity_name.clone(),
            predicted_rate,
            predicted_students_impacted,
            target_year,
            features,
            department_code: record.department_id,
        })
    }

    /// Feature values of the latest row, as a forecast would see them.
    pub fn features(&self, entity_name: &str) -> Result<FeatureSnapshot, ForecastError> {
        let record = EntityResolver::new(&self.table).resolve(entity_name)?;
        let features = FeatureName::ordered()
            .into_iter()
            .map(|name| FeatureSummary {
                name: name.key(),
                description: name.description(),
                current_value: record.serving_value(name),
                unit: name.unit(),
            })
            .collect();

        Ok(FeatureSnapshot {
            entity_name: record.entity_name.clone(),
            department_code: record.department_id,
            latest_year: record.year,
            features,
        })
    }

    /// Unique municipality display names, sorted.
    pub fn municipalities(&self) -> Vec<String> {
        self.table
            .rows()
            .iter()
            .map(|record| record.entity_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn municipality_count(&self) -> usize {
        self.municipalities().len()
    }

    pub fn departments(&self) -> Vec<DepartmentMunicipalities> {
        let mut grouped: BTreeMap<i64, BTreeSet<&str>> = BTreeMap::new();
        for record in self.table.rows() {
            grouped
                .entry(record.department_id)
                .or_default()
                .insert(record.entity_name.as_str());
        }

        grouped
            .into_iter()
            .map(|(code, names)| {
                let municipalities: Vec<String> = names.into_iter().map(str::to_string).collect();
                DepartmentMunicipalities {
                    code,
                    name: department_name(code),
                    count: municipalities.len(),
                    municipalities,
                }
            })
            .collect()
    }

    pub fn model_features(&self) -> Vec<&'static str> {
        FeatureName::ordered().into_iter().map(FeatureName::key).collect()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn health(&self) -> HealthView {
        let model_loaded = self.is_model_loaded();
        HealthView {
            status: if model_loaded { "healthy" } else { "degraded" },
            model_loaded,
            total_municipalities: self.municipality_count(),
            model_features: self.model_features(),
        }
    }
}
