use dropout_forecast::dataset::MunicipalDatasetImporter;
use dropout_forecast::features::{FeatureEngineer, FeatureName, HistoricalTable, LagPolicy, Record};

fn sample_rows() -> Vec<dropout_forecast::dataset::RawRecord> {
    let data = include_bytes!("fixtures/municipios_sample.csv");
    MunicipalDatasetImporter::from_reader(&data[..]).expect("sample dataset imports")
}

fn row(table: &HistoricalTable, entity_id: i64, year: i32) -> &Record {
    table
        .rows()
        .iter()
        .find(|record| record.entity_id == entity_id && record.year == year)
        .expect("row present")
}

#[test]
fn importer_skips_rows_with_unusable_keys() {
    let rows = sample_rows();
    assert_eq!(rows.len(), 14);
    assert!(rows.iter().all(|row| row.entity_name != "Broken"));
}

#[test]
fn prepared_table_is_canonical_and_complete() {
    let prepared = FeatureEngineer::new().prepare(&sample_rows());
    let history = &prepared.history;

    assert_eq!(history.len(), 14);
    assert!(history.is_canonically_ordered());
    assert_eq!(history.latest_year(), Some(2023));
    assert_eq!(prepared.trainable.len(), 7);
    assert!(prepared.trainable.iter().all(Record::is_trainable));
}

#[test]
fn palmira_latest_row_carries_derived_features() {
    let prepared = FeatureEngineer::new().prepare(&sample_rows());
    let palmira = row(&prepared.history, 76520, 2023);

    assert_eq!(palmira.search_key, "palmira");
    assert!(!palmira.is_capital);
    let gap = palmira.over_age_gap.expect("gap");
    assert!((gap - 11.9).abs() < 1e-9);
    assert_eq!(palmira.repetition_lag1, Some(2.8));
    assert_eq!(palmira.dept_year_avg_dropout, Some(3.5));
    assert_eq!(palmira.dept_risk_lag, Some(3.75));
    assert_eq!(palmira.classroom_density, Some(31.5));
    let funnel = palmira.funnel_ratio.expect("funnel");
    assert!((funnel - 72.2 / 88.001).abs() < 1e-12);

    assert_eq!(palmira.serving_value(FeatureName::RepetitionLag), Some(3.1));
    assert_eq!(palmira.training_value(FeatureName::RepetitionLag), Some(2.8));
}

#[test]
fn capital_tokens_are_recognized_in_both_languages() {
    let prepared = FeatureEngineer::new().prepare(&sample_rows());
    assert!(row(&prepared.history, 76001, 2023).is_capital);
    assert!(row(&prepared.history, 5001, 2023).is_capital);
    assert!(row(&prepared.history, 27001, 2023).is_capital);
    assert!(!row(&prepared.history, 5088, 2023).is_capital);
}

#[test]
fn lags_only_read_the_same_entity_one_year_earlier() {
    let prepared = FeatureEngineer::new().prepare(&sample_rows());
    let rows = prepared.history.rows();

    for record in rows {
        let predecessor = rows
            .iter()
            .find(|other| other.entity_id == record.entity_id && other.year == record.year - 1);
        match predecessor {
            Some(previous) => assert_eq!(record.repetition_lag1, previous.repetition_rate),
            None => assert_eq!(record.repetition_lag1, None, "{} {}", record.entity_name, record.year),
        }
    }
}

#[test]
fn year_gaps_follow_the_lag_policy() {
    let adjacent = FeatureEngineer::new().prepare(&sample_rows());
    let bello = row(&adjacent.history, 5088, 2023);
    assert_eq!(bello.repetition_lag1, None);
    assert!(!bello.is_trainable());

    let previous_row = FeatureEngineer::with_lag_policy(LagPolicy::PreviousRow).prepare(&sample_rows());
    let bello = row(&previous_row.history, 5088, 2023);
    assert_eq!(bello.repetition_lag1, Some(3.5));
    assert!(bello.is_trainable());
    assert_eq!(previous_row.trainable.len(), 8);
}

#[test]
fn missing_target_keeps_row_out_of_training_only() {
    let prepared = FeatureEngineer::new().prepare(&sample_rows());
    let tulua = row(&prepared.history, 76834, 2023);
    assert_eq!(tulua.dropout_rate, None);
    assert!(!tulua.is_trainable());
    assert_eq!(tulua.population_5_16, Some(50000.0));
}

#[test]
fn preparation_is_deterministic_and_order_independent() {
    let rows = sample_rows();
    let mut reversed = rows.clone();
    reversed.reverse();

    let engineer = FeatureEngineer::new();
    let first = serde_json::to_string(&engineer.prepare(&rows).history).expect("serializes");
    let second = serde_json::to_string(&engineer.prepare(&rows).history).expect("serializes");
    let shuffled = serde_json::to_string(&engineer.prepare(&reversed).history).expect("serializes");

    assert_eq!(first, second);
    assert_eq!(first, shuffled);
}
