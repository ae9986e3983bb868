use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// The model's fixed input set, in the order the regressor expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureName {
    OverAgeGap,
    RepetitionLag,
    ClassroomDensity,
    Population,
    CapitalFlag,
    DepartmentCode,
    FunnelRatio,
    DepartmentRiskLag,
}

pub const FEATURE_COUNT: usize = 8;

impl FeatureName {
    pub const fn ordered() -> [Self; FEATURE_COUNT] {
        [
            Self::OverAgeGap,
            Self::RepetitionLag,
            Self::ClassroomDensity,
            Self::Population,
            Self::CapitalFlag,
            Self::DepartmentCode,
            Self::FunnelRatio,
            Self::DepartmentRiskLag,
        ]
    }

    /// Column name the trained model was fitted against.
    pub const fn key(self) -> &'static str {
        match self {
            Self::OverAgeGap => "over_age_gap",
            Self::RepetitionLag => "repitencia_lag_1",
            Self::ClassroomDensity => "classroom_density",
            Self::Population => "POBLACIÓN_5_16",
            Self::CapitalFlag => "is_capital_flag",
            Self::DepartmentCode => "CÓDIGO_DEPARTAMENTO",
            Self::FunnelRatio => "primaria_to_media_ratio",
            Self::DepartmentRiskLag => "dept_risk_lag",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::RepetitionLag => &["repetition_rate"],
            Self::Population => &["population_5_16"],
            Self::CapitalFlag => &["is_capital"],
            Self::DepartmentCode => &["department_id"],
            Self::FunnelRatio => &["funnel_ratio"],
            Self::DepartmentRiskLag => &["dept_year_avg_dropout"],
            Self::OverAgeGap | Self::ClassroomDensity => &[],
        }
    }

    /// Accepts the model column name or the snake_case name of the column
    /// that fills the slot at serving time.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ordered()
            .into_iter()
            .find(|name| name.key() == key || name.aliases().contains(&key))
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::OverAgeGap => "Difference between gross and net coverage",
            Self::RepetitionLag => "Last year's repetition rate",
            Self::ClassroomDensity => "Average class size",
            Self::Population => "Population aged 5-16",
            Self::CapitalFlag => "Whether municipality is a capital",
            Self::DepartmentCode => "Department identifier",
            Self::FunnelRatio => "Educational funnel ratio",
            Self::DepartmentRiskLag => "Department average dropout (previous year)",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::OverAgeGap | Self::RepetitionLag | Self::DepartmentRiskLag => "%",
            Self::ClassroomDensity | Self::Population => "students",
            Self::CapitalFlag => "flag",
            Self::DepartmentCode => "code",
            Self::FunnelRatio => "ratio",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fixed-arity model input. Serializes as a map in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_fn(mut value: impl FnMut(FeatureName) -> f64) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for name in FeatureName::ordered() {
            values[name.index()] = value(name);
        }
        Self { values }
    }

    /// Builds a vector when every feature is available.
    pub fn try_from_fn(mut value: impl FnMut(FeatureName) -> Option<f64>) -> Option<Self> {
        let mut values = [0.0; FEATURE_COUNT];
        for name in FeatureName::ordered() {
            values[name.index()] = value(name)?;
        }
        Some(Self { values })
    }

    pub fn get(&self, name: FeatureName) -> f64 {
        self.values[name.index()]
    }

    pub fn set(&mut self, name: FeatureName, value: f64) {
        self.values[name.index()] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ordered()
            .into_iter()
            .map(move |name| (name, self.get(name)))
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.key(), &value)?;
        }
        map.end()
    }
}
