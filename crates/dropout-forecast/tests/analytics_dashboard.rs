use dropout_forecast::analytics::{AnalyticsEngine, RiskLevel, Trend};
use dropout_forecast::dataset::MunicipalDatasetImporter;
use dropout_forecast::features::FeatureEngineer;
use std::sync::Arc;

fn engine() -> AnalyticsEngine {
    let data = include_bytes!("fixtures/municipios_sample.csv");
    let raw = MunicipalDatasetImporter::from_reader(&data[..]).expect("sample dataset imports");
    AnalyticsEngine::new(Arc::new(FeatureEngineer::new().prepare(&raw).history))
}

#[test]
fn national_summary_weights_by_population() {
    let national = engine().national();

    assert_eq!(national.current_year, 2023);
    assert_eq!(national.dropout_rate, 3.44);
    assert_eq!(national.previous_year_dropout, 3.55);
    assert_eq!(national.year_over_year_change, -0.12);
    assert_eq!(national.trend, Trend::Decreasing);
    assert_eq!(national.total_students, 1_032_500);
    assert_eq!(national.funnel_efficiency, 0.79);
}

#[test]
fn departments_rank_by_latest_dropout() {
    let departments = engine().departments();
    let codes: Vec<&str> = departments.iter().map(|department| department.code.as_str()).collect();
    assert_eq!(codes, vec!["27", "76", "5"]);

    let choco = &departments[0];
    assert_eq!(choco.name, "Chocó");
    assert_eq!(choco.dropout_rate, 7.9);
    assert_eq!(choco.risk_level, RiskLevel::High);

    let valle = &departments[1];
    assert_eq!(valle.dropout_rate, 3.58);
    assert_eq!(valle.risk_level, RiskLevel::Medium);
    assert_eq!(valle.student_count, 490_000);
    assert_eq!(valle.municipality_count, 3);
}

#[test]
fn risk_tier_uses_the_unrounded_rate() {
    let departments = engine().departments();
    let antioquia = departments
        .iter()
        .find(|department| department.code == "5")
        .expect("antioquia present");

    assert_eq!(antioquia.dropout_rate, 3.0);
    assert_eq!(antioquia.risk_level, RiskLevel::Low);
}

#[test]
fn trends_cover_every_year_in_order() {
    let trends = engine().historical_trends(None);
    let summary: Vec<(i32, f64, u64)> = trends
        .iter()
        .map(|trend| (trend.year, trend.dropout_rate, trend.students))
        .collect();
    assert_eq!(
        summary,
        vec![(2021, 3.74, 954_000), (2022, 3.55, 895_500), (2023, 3.44, 1_032_500)]
    );
    assert_eq!(trends[0].funnel_ratio, 0.82);
}

#[test]
fn department_trends_filter_rows() {
    let valle: Vec<(i32, f64)> = engine()
        .historical_trends(Some(76))
        .iter()
        .map(|trend| (trend.year, trend.dropout_rate))
        .collect();
    assert_eq!(valle, vec![(2021, 4.16), (2022, 3.95), (2023, 3.58)]);

    let choco = engine().historical_trends(Some(27));
    assert_eq!(choco.len(), 2);
    assert_eq!(choco[0].year, 2022);
}
