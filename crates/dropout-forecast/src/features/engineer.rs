use super::domain::{HistoricalTable, Record};
use super::imputation::impute_classroom_density;
use crate::dataset::RawRecord;
use std::collections::BTreeMap;
use tracing::info;

/// How a row finds the earlier observation its lag features read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LagPolicy {
    /// Only the same entity's row for `year - 1`; a gap leaves the lag empty.
    #[default]
    AdjacentYear,
    /// The previous row of the same entity, however many years back it is.
    PreviousRow,
}

/// Output of [`FeatureEngineer::prepare`].
#[derive(Debug, Clone, Default)]
pub struct PreparedDataset {
    /// Every row, kept for aggregation.
    pub history: HistoricalTable,
    /// Rows with a target and both lag features.
    pub trainable: Vec<Record>,
}

/// Turns raw yearly records into the canonical historical table.
///
/// Malformed cells never fail the pipeline: they become `None`, flow through
/// the derived columns and finally keep the row out of the trainable subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngineer {
    lag_policy: LagPolicy,
}

impl FeatureEngineer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lag_policy(lag_policy: LagPolicy) -> Self {
        Self { lag_policy }
    }

    pub fn lag_policy(&self) -> LagPolicy {
        self.lag_policy
    }

    pub fn prepare(&self, raw: &[RawRecord]) -> PreparedDataset {
        let mut rows: Vec<Record> = raw.iter().map(Record::from_raw).collect();
        rows.sort_by_key(|record| (record.entity_id, record.year));

        let predecessors = predecessor_indices(&rows, self.lag_policy);

        let repetition: Vec<Option<f64>> = rows.iter().map(|record| record.repetition_rate).collect();
        for (record, lagged) in rows.iter_mut().zip(lag(&repetition, &predecessors)) {
            record.repetition_lag1 = lagged;
        }

        attach_department_year_average(&mut rows);

        // The department average is broadcast without reordering, so the
        // entity ordering used by `predecessors` still holds.
        let department_average: Vec<Option<f64>> = rows
            .iter()
            .map(|record| record.dept_year_avg_dropout)
            .collect();
        for (record, lagged) in rows.iter_mut().zip(lag(&department_average, &predecessors)) {
            record.dept_risk_lag = lagged;
        }

        impute_classroom_density(&mut rows);

        let trainable: Vec<Record> = rows.iter().filter(|record| record.is_trainable()).cloned().collect();
        info!(
            rows = rows.len(),
            trainable = trainable.len(),
            policy = ?self.lag_policy,
            "historical table prepared"
        );

        PreparedDataset {
            history: HistoricalTable::from_sorted_rows(rows),
            trainable,
        }
    }
}

/// For each row of a `(entity_id, year)`-sorted slice, the index of the row
/// its lag features read from.
fn predecessor_indices(rows: &[Record], policy: LagPolicy) -> Vec<Option<usize>> {
    (0..rows.len())
        .map(|index| {
            let previous_index = index.checked_sub(1)?;
            let (previous, current) = (&rows[previous_index], &rows[index]);
            if previous.entity_id != current.entity_id {
                return None;
            }
            match policy {
                LagPolicy::PreviousRow => Some(previous_index),
                LagPolicy::AdjacentYear => {
                    (Some(previous.year) == current.year.checked_sub(1)).then_some(previous_index)
                }
            }
        })
        .collect()
}

fn lag<'a>(
    column: &'a [Option<f64>],
    predecessors: &'a [Option<usize>],
) -> impl Iterator<Item = Option<f64>> + 'a {
    predecessors
        .iter()
        .map(move |predecessor| predecessor.and_then(|index| column[index]))
}

/// Mean dropout of every `(department_id, year)` group, broadcast back to
/// each member row. Rows without a dropout value do not count.
fn attach_department_year_average(rows: &mut [Record]) {
    let mut totals: BTreeMap<(i64, i32), (f64, usize)> = BTreeMap::new();
    for record in rows.iter() {
        let entry = totals
            .entry((record.department_id, record.year))
            .or_insert((0.0, 0));
        if let Some(dropout) = record.dropout_rate {
            entry.0 += dropout;
            entry.1 += 1;
        }
    }

    for record in rows.iter_mut() {
        record.dept_year_avg_dropout = totals
            .get(&(record.department_id, record.year))
            .and_then(|&(sum, count)| (count > 0).then(|| sum / count as f64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawCell;

    fn raw(entity_id: i64, department_id: i64, year: i32, dropout: f64, repetition: f64) -> RawRecord {
        RawRecord {
            dropout_rate: RawCell::from(dropout),
            repetition_rate: RawCell::from(repetition),
            ..RawRecord::new(entity_id, format!("Town {entity_id}"), department_id, year)
        }
    }

    fn find(table: &HistoricalTable, entity_id: i64, year: i32) -> &Record {
        table
            .rows()
            .iter()
            .find(|record| record.entity_id == entity_id && record.year == year)
            .expect("row present")
    }

    #[test]
    fn rows_are_sorted_by_entity_then_year() {
        let input = vec![
            raw(2, 5, 2022, 3.0, 1.0),
            raw(1, 5, 2023, 3.0, 1.0),
            raw(1, 5, 2021, 3.0, 1.0),
        ];
        let prepared = FeatureEngineer::new().prepare(&input);
        let keys: Vec<(i64, i32)> = prepared
            .history
            .rows()
            .iter()
            .map(|record| (record.entity_id, record.year))
            .collect();
        assert_eq!(keys, vec![(1, 2021), (1, 2023), (2, 2022)]);
        assert!(prepared.history.is_canonically_ordered());
    }

    #[test]
    fn repetition_lag_never_crosses_entities() {
        let input = vec![raw(1, 5, 2022, 3.0, 4.0), raw(2, 5, 2023, 3.0, 1.0)];
        let prepared = FeatureEngineer::new().prepare(&input);
        assert_eq!(find(&prepared.history, 2, 2023).repetition_lag1, None);
    }

    #[test]
    fn earliest_representable_year_has_no_lag() {
        let input = vec![raw(1, 5, i32::MIN, 3.0, 4.0), raw(1, 5, i32::MIN, 3.0, 2.0)];
        let prepared = FeatureEngineer::new().prepare(&input);
        assert!(prepared
            .history
            .rows()
            .iter()
            .all(|record| record.repetition_lag1.is_none() && record.dept_risk_lag.is_none()));
        assert!(prepared.trainable.is_empty());
    }

    #[test]
    fn year_gap_handling_depends_on_policy() {
        let input = vec![raw(1, 5, 2020, 3.0, 4.0), raw(1, 5, 2022, 3.0, 2.0)];

        let adjacent = FeatureEngineer::new().prepare(&input);
        assert_eq!(find(&adjacent.history, 1, 2022).repetition_lag1, None);

        let previous_row = FeatureEngineer::with_lag_policy(LagPolicy::PreviousRow).prepare(&input);
        assert_eq!(find(&previous_row.history, 1, 2022).repetition_lag1, Some(4.0));
    }

    #[test]
    fn department_average_is_group_mean_and_lagged_per_entity() {
        let input = vec![
            raw(1, 5, 2022, 2.0, 1.0),
            raw(2, 5, 2022, 4.0, 1.0),
            raw(1, 5, 2023, 6.0, 1.0),
            raw(2, 5, 2023, 8.0, 1.0),
            raw(3, 8, 2023, 1.0, 1.0),
        ];
        let prepared = FeatureEngineer::new().prepare(&input);
        let history = &prepared.history;

        assert_eq!(find(history, 1, 2022).dept_year_avg_dropout, Some(3.0));
        assert_eq!(find(history, 2, 2023).dept_year_avg_dropout, Some(7.0));
        assert_eq!(find(history, 3, 2023).dept_year_avg_dropout, Some(1.0));
        assert_eq!(find(history, 1, 2023).dept_risk_lag, Some(3.0));
        assert_eq!(find(history, 1, 2022).dept_risk_lag, None);
        assert_eq!(find(history, 3, 2023).dept_risk_lag, None);
    }

    #[test]
    fn rows_missing_target_or_lags_stay_out_of_trainable_subset() {
        let mut no_target = raw(1, 5, 2023, 0.0, 1.0);
        no_target.dropout_rate = RawCell::from("sin dato");
        let input = vec![raw(1, 5, 2022, 3.0, 2.0), no_target, raw(2, 5, 2023, 3.0, 1.0)];

        let prepared = FeatureEngineer::new().prepare(&input);
        assert_eq!(prepared.history.len(), 3);
        assert!(prepared.trainable.is_empty());
        assert_eq!(find(&prepared.history, 1, 2023).dropout_rate, None);
        assert_eq!(find(&prepared.history, 1, 2023).repetition_lag1, Some(2.0));
    }

    #[test]
    fn trainable_rows_have_both_lags() {
        let input = vec![raw(1, 5, 2022, 3.0, 2.0), raw(1, 5, 2023, 3.5, 2.5)];
        let prepared = FeatureEngineer::new().prepare(&input);
        assert_eq!(prepared.trainable.len(), 1);
        let row = &prepared.trainable[0];
        assert_eq!(row.year, 2023);
        assert_eq!(row.repetition_lag1, Some(2.0));
        assert_eq!(row.dept_risk_lag, Some(3.0));
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let prepared = FeatureEngineer::new().prepare(&[]);
        assert!(prepared.history.is_empty());
        assert!(prepared.trainable.is_empty());
    }
}
