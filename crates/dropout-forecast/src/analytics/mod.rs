mod departments;
mod summary;
pub mod views;

pub use departments::department_name;
pub use summary::{round2, weighted_rate, AnalyticsEngine};
pub use views::{DepartmentAnalytics, HistoricalTrend, NationalAnalytics, RiskLevel, Trend};
