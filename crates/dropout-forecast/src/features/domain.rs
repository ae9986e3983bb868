use super::vector::{FeatureName, FeatureVector};
use crate::dataset::{is_affirmative, normalize, RawRecord};
use serde::{Deserialize, Serialize};

/// Guard added to the primary coverage before dividing.
pub const FUNNEL_EPSILON: f64 = 0.001;
/// Hard upper bound of the secondary/primary coverage ratio.
pub const FUNNEL_CEILING: f64 = 1.5;

/// One cleaned municipality-year row with its derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity_id: i64,
    pub entity_name: String,
    pub department_id: i64,
    pub year: i32,
    pub gross_coverage: Option<f64>,
    pub net_coverage: Option<f64>,
    pub dropout_rate: Option<f64>,
    pub repetition_rate: Option<f64>,
    pub avg_class_size: Option<f64>,
    pub net_coverage_primary: Option<f64>,
    pub net_coverage_secondary: Option<f64>,
    pub population_5_16: Option<f64>,
    pub is_capital: bool,
    pub over_age_gap: Option<f64>,
    pub repetition_lag1: Option<f64>,
    pub funnel_ratio: Option<f64>,
    pub dept_year_avg_dropout: Option<f64>,
    pub dept_risk_lag: Option<f64>,
    pub classroom_density: Option<f64>,
    pub search_key: String,
}

impl Record {
    /// Coerces the raw cells and fills the row-local derived columns. Lags,
    /// department context and density imputation need the whole table and are
    /// left empty here.
    pub(crate) fn from_raw(raw: &RawRecord) -> Self {
        let gross_coverage = raw.gross_coverage.coerce();
        let net_coverage = raw.net_coverage.coerce();
        let net_coverage_primary = raw.net_coverage_primary.coerce();
        let net_coverage_secondary = raw.net_coverage_secondary.coerce();

        Self {
            entity_id: raw.entity_id,
            entity_name: raw.entity_name.clone(),
            department_id: raw.department_id,
            year: raw.year,
            gross_coverage,
            net_coverage,
            dropout_rate: raw.dropout_rate.coerce(),
            repetition_rate: raw.repetition_rate.coerce(),
            avg_class_size: raw.avg_class_size.coerce(),
            net_coverage_primary,
            net_coverage_secondary,
            population_5_16: raw.population_5_16.coerce(),
            is_capital: raw.is_capital.as_deref().is_some_and(is_affirmative),
            over_age_gap: over_age_gap(gross_coverage, net_coverage),
            repetition_lag1: None,
            funnel_ratio: funnel_ratio(net_coverage_secondary, net_coverage_primary),
            dept_year_avg_dropout: None,
            dept_risk_lag: None,
            classroom_density: None,
            search_key: normalize(&raw.entity_name),
        }
    }

    /// Rows with a target and both lagged features can be fitted or scored.
    pub fn is_trainable(&self) -> bool {
        self.dropout_rate.is_some() && self.repetition_lag1.is_some() && self.dept_risk_lag.is_some()
    }

    pub fn capital_flag(&self) -> f64 {
        if self.is_capital {
            1.0
        } else {
            0.0
        }
    }

    /// Feature values as seen during fitting: both lag columns are the real
    /// prior-year values.
    pub fn training_value(&self, name: FeatureName) -> Option<f64> {
        match name {
            FeatureName::RepetitionLag => self.repetition_lag1,
            FeatureName::DepartmentRiskLag => self.dept_risk_lag,
            other => self.shared_value(other),
        }
    }

    /// Feature values for a forecast from this row: the freshest repetition
    /// rate and department average stand in for next year's lags.
    pub fn serving_value(&self, name: FeatureName) -> Option<f64> {
        match name {
            FeatureName::RepetitionLag => self.repetition_rate,
            FeatureName::DepartmentRiskLag => self.dept_year_avg_dropout,
            other => self.shared_value(other),
        }
    }

    pub fn training_features(&self) -> Option<FeatureVector> {
        FeatureVector::try_from_fn(|name| self.training_value(name))
    }

    fn shared_value(&self, name: FeatureName) -> Option<f64> {
        match name {
            FeatureName::OverAgeGap => self.over_age_gap,
            FeatureName::ClassroomDensity => self.classroom_density,
            FeatureName::Population => self.population_5_16,
            FeatureName::CapitalFlag => Some(self.capital_flag()),
            FeatureName::DepartmentCode => Some(self.department_id as f64),
            FeatureName::FunnelRatio => self.funnel_ratio,
            FeatureName::RepetitionLag => self.repetition_lag1,
            FeatureName::DepartmentRiskLag => self.dept_risk_lag,
        }
    }
}

pub(crate) fn over_age_gap(gross: Option<f64>, net: Option<f64>) -> Option<f64> {
    Some(gross? - net?)
}

/// Secondary over primary net coverage, clamped to `[0, FUNNEL_CEILING]`.
pub(crate) fn funnel_ratio(secondary: Option<f64>, primary: Option<f64>) -> Option<f64> {
    let ratio = secondary? / (primary? + FUNNEL_EPSILON);
    if ratio.is_nan() {
        return None;
    }
    Some(ratio.clamp(0.0, FUNNEL_CEILING))
}

/// The canonical historical table. Rows are ordered by `(entity_id, year)`
/// and never change once built; consumers only read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalTable {
    rows: Vec<Record>,
}

impl HistoricalTable {
    pub(crate) fn from_sorted_rows(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.rows.iter().map(|record| record.year).max()
    }

    pub fn rows_for_year(&self, year: i32) -> impl Iterator<Item = &Record> + '_ {
        self.rows.iter().filter(move |record| record.year == year)
    }

    /// True when rows are in `(entity_id, year)` order.
    pub fn is_canonically_ordered(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| (pair[0].entity_id, pair[0].year) <= (pair[1].entity_id, pair[1].year))
    }
}
