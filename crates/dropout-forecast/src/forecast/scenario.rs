use super::ForecastError;
use crate::features::{FeatureName, FeatureVector, Record};
use std::collections::BTreeMap;
use tracing::debug;

/// Caller-supplied what-if values keyed by feature name.
pub type Overrides = BTreeMap<String, f64>;

/// Builds the model input for one municipality's latest row.
///
/// Forecasts use the serving convention: the current repetition rate and the
/// current department average occupy the two lag slots.
pub struct ScenarioComposer;

impl ScenarioComposer {
    pub fn compose(record: &Record, overrides: &Overrides) -> Result<FeatureVector, ForecastError> {
        let adjustments = Self::recognized(overrides);

        let mut vector = FeatureVector::from_fn(|_| 0.0);
        for name in FeatureName::ordered() {
            let baseline = record.serving_value(name);
            let value = match adjustments.get(&name) {
                Some(&adjusted) => {
                    debug!(feature = %name, from = ?baseline, to = adjusted, "applying scenario adjustment");
                    adjusted
                }
                None => baseline.ok_or_else(|| ForecastError::MissingFeature {
                    entity: record.entity_name.clone(),
                    feature: name,
                })?,
            };
            vector.set(name, value);
        }

        Ok(vector)
    }

    /// Overrides whose key names a model feature; other keys are dropped.
    pub fn recognized(overrides: &Overrides) -> BTreeMap<FeatureName, f64> {
        overrides
            .iter()
            .filter_map(|(key, value)| match FeatureName::from_key(key) {
                Some(name) => Some((name, *value)),
                None => {
                    debug!(key = key.as_str(), "ignoring unknown scenario adjustment");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawRecord;

    fn palmira() -> Record {
        let mut record = RawRecord::new(76520, "Palmira", 76, 2023);
        record.is_capital = Some("no".to_string());
        let mut record = crate::features::FeatureEngineer::new()
            .prepare(&[record])
            .history
            .rows()[0]
            .clone();
        record.over_age_gap = Some(15.2);
        record.repetition_rate = Some(3.1);
        record.repetition_lag1 = Some(2.8);
        record.classroom_density = Some(32.5);
        record.population_5_16 = Some(45000.0);
        record.funnel_ratio = Some(0.82);
        record.dept_year_avg_dropout = Some(2.9);
        record.dept_risk_lag = Some(2.6);
        record
    }

    #[test]
    fn baseline_vector_uses_serving_convention() {
        let vector = ScenarioComposer::compose(&palmira(), &Overrides::new()).expect("composes");
        assert_eq!(vector.get(FeatureName::RepetitionLag), 3.1);
        assert_eq!(vector.get(FeatureName::DepartmentRiskLag), 2.9);
        assert_eq!(vector.get(FeatureName::DepartmentCode), 76.0);
        assert_eq!(vector.get(FeatureName::CapitalFlag), 0.0);
        assert_eq!(vector.get(FeatureName::Population), 45000.0);
    }

    #[test]
    fn override_replaces_only_the_named_feature() {
        let record = palmira();
        let baseline = ScenarioComposer::compose(&record, &Overrides::new()).expect("composes");
        let overrides = Overrides::from([("classroom_density".to_string(), 99.0)]);
        let adjusted = ScenarioComposer::compose(&record, &overrides).expect("composes");

        for (name, value) in adjusted.iter() {
            if name == FeatureName::ClassroomDensity {
                assert_eq!(value, 99.0);
            } else {
                assert_eq!(value, baseline.get(name));
            }
        }
    }

    #[test]
    fn unknown_keys_leave_vector_unchanged() {
        let record = palmira();
        let baseline = ScenarioComposer::compose(&record, &Overrides::new()).expect("composes");
        let overrides = Overrides::from([("teacher_salary".to_string(), 1.0)]);
        let adjusted = ScenarioComposer::compose(&record, &overrides).expect("composes");
        assert_eq!(adjusted, baseline);
    }

    #[test]
    fn override_fills_a_missing_value() {
        let mut record = palmira();
        record.classroom_density = None;

        let error = ScenarioComposer::compose(&record, &Overrides::new()).expect_err("missing");
        assert!(matches!(
            error,
            ForecastError::MissingFeature { feature: FeatureName::ClassroomDensity, .. }
        ));

        let overrides = Overrides::from([("classroom_density".to_string(), 30.0)]);
        let vector = ScenarioComposer::compose(&record, &overrides).expect("override fills gap");
        assert_eq!(vector.get(FeatureName::ClassroomDensity), 30.0);
    }
}
