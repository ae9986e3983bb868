use super::departments::department_name;
use super::views::{DepartmentAnalytics, HistoricalTrend, NationalAnalytics, RiskLevel, Trend};
use crate::features::{HistoricalTable, Record};
use std::collections::BTreeMap;
use std::sync::Arc;

/// `Σ(rate × population) / Σ(population)` over `(rate, population)` pairs;
/// `None` when the total population is zero.
pub fn weighted_rate(samples: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let (weighted_sum, population) = samples
        .into_iter()
        .fold((0.0, 0.0), |(sum, total), (rate, population)| {
            (sum + rate * population, total + population)
        });
    (population > 0.0).then(|| weighted_sum / population)
}

/// Rounds to two decimals, the precision of every published figure.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Running totals for one aggregation group.
#[derive(Debug, Default, Clone)]
struct GroupStats {
    weighted_sum: f64,
    weight_total: f64,
    population_total: f64,
    funnel_sum: f64,
    funnel_count: usize,
    rows: usize,
}

impl GroupStats {
    fn collect<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.push(record);
        }
        stats
    }

    fn push(&mut self, record: &Record) {
        self.rows += 1;
        if let Some(population) = record.population_5_16 {
            self.population_total += population;
            if let Some(rate) = record.dropout_rate {
                self.weighted_sum += rate * population;
                self.weight_total += population;
            }
        }
        if let Some(funnel) = record.funnel_ratio {
            self.funnel_sum += funnel;
            self.funnel_count += 1;
        }
    }

    fn weighted_dropout(&self) -> Option<f64> {
        (self.weight_total > 0.0).then(|| self.weighted_sum / self.weight_total)
    }

    fn students(&self) -> u64 {
        self.population_total.max(0.0) as u64
    }

    /// Simple mean of the funnel ratio; 0 when no row carries one.
    fn mean_funnel(&self) -> f64 {
        if self.funnel_count == 0 {
            0.0
        } else {
            self.funnel_sum / self.funnel_count as f64
        }
    }
}

/// Population-weighted dashboard statistics over the shared historical
/// table. Every operation is a read-only scan; degenerate input yields
/// zeroed figures or empty lists instead of errors.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    table: Arc<HistoricalTable>,
}

impl AnalyticsEngine {
    pub fn new(table: Arc<HistoricalTable>) -> Self {
        Self { table }
    }

    pub fn national(&self) -> NationalAnalytics {
        let Some(latest_year) = self.table.latest_year() else {
            return NationalAnalytics::default();
        };

        let current = GroupStats::collect(self.table.rows_for_year(latest_year));
        let previous = match latest_year.checked_sub(1) {
            Some(previous_year) => GroupStats::collect(self.table.rows_for_year(previous_year)),
            None => GroupStats::default(),
        };

        let dropout_rate = current.weighted_dropout().unwrap_or(0.0);
        let previous_year_dropout = previous.weighted_dropout().unwrap_or(dropout_rate);
        let change = dropout_rate - previous_year_dropout;

        NationalAnalytics {
            current_year: latest_year,
            dropout_rate: round2(dropout_rate),
            total_students: current.students(),
            year_over_year_change: round2(change),
            funnel_efficiency: round2(current.mean_funnel()),
            trend: Trend::from_change(change),
            previous_year_dropout: round2(previous_year_dropout),
        }
    }

    /// Latest-year figures per department, highest dropout first.
    pub fn departments(&self) -> Vec<DepartmentAnalytics> {
        let Some(latest_year) = self.table.latest_year() else {
            return Vec::new();
        };

        let mut groups: BTreeMap<i64, GroupStats> = BTreeMap::new();
        for record in self.table.rows_for_year(latest_year) {
            groups.entry(record.department_id).or_default().push(record);
        }

        let mut departments: Vec<DepartmentAnalytics> = groups
            .into_iter()
            .map(|(code, stats)| {
                let dropout = stats.weighted_dropout().unwrap_or(0.0);
                DepartmentAnalytics {
                    code: code.to_string(),
                    name: department_name(code),
                    dropout_rate: round2(dropout),
                    student_count: stats.students(),
                    risk_level: RiskLevel::from_rate(dropout),
                    municipality_count: stats.rows,
                }
            })
            .collect();

        departments.sort_by(|a, b| b.dropout_rate.total_cmp(&a.dropout_rate));
        departments
    }

    /// Yearly figures, optionally for a single department, oldest first.
    pub fn historical_trends(&self, department: Option<i64>) -> Vec<HistoricalTrend> {
        let mut years: BTreeMap<i32, GroupStats> = BTreeMap::new();
        for record in self.table.rows() {
            if department.is_some_and(|code| record.department_id != code) {
                continue;
            }
            years.entry(record.year).or_default().push(record);
        }

        years
            .into_iter()
            .map(|(year, stats)| HistoricalTrend {
                year,
                dropout_rate: round2(stats.weighted_dropout().unwrap_or(0.0)),
                students: stats.students(),
                funnel_ratio: round2(stats.mean_funnel()),
            })
            .collect()
    }
}
