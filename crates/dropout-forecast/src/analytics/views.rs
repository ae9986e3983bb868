use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Year-over-year changes within ±0.1 points count as stable.
    pub fn from_change(change: f64) -> Self {
        if change > 0.1 {
            Self::Increasing
        } else if change < -0.1 {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// `High` from 6 %, `Medium` from 3 %; both bounds inclusive.
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 6.0 {
            Self::High
        } else if rate >= 3.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalAnalytics {
    pub current_year: i32,
    pub dropout_rate: f64,
    pub total_students: u64,
    pub year_over_year_change: f64,
    pub funnel_efficiency: f64,
    pub trend: Trend,
    pub previous_year_dropout: f64,
}

impl Default for NationalAnalytics {
    fn default() -> Self {
        Self {
            current_year: 0,
            dropout_rate: 0.0,
            total_students: 0,
            year_over_year_change: 0.0,
            funnel_efficiency: 0.0,
            trend: Trend::Stable,
            previous_year_dropout: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentAnalytics {
    pub code: String,
    pub name: String,
    pub dropout_rate: f64,
    pub student_count: u64,
    pub risk_level: RiskLevel,
    pub municipality_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalTrend {
    pub year: i32,
    pub dropout_rate: f64,
    pub students: u64,
    pub funnel_ratio: f64,
}
