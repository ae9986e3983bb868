use crate::infra::parse_adjustment;
use clap::{Args, Subcommand, ValueEnum};
use dropout_forecast::analytics::AnalyticsEngine;
use dropout_forecast::config::AppConfig;
use dropout_forecast::dataset::MunicipalDatasetImporter;
use dropout_forecast::error::AppError;
use dropout_forecast::features::{FeatureEngineer, LagPolicy};
use dropout_forecast::forecast::{ForecastService, ModelArtifact, Overrides, RidgeTrainer};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum LagPolicyArg {
    /// Lags read only the immediately preceding year
    #[default]
    AdjacentYear,
    /// Lags read the previous available year, skipping gaps
    PreviousRow,
}

impl From<LagPolicyArg> for LagPolicy {
    fn from(value: LagPolicyArg) -> Self {
        match value {
            LagPolicyArg::AdjacentYear => LagPolicy::AdjacentYear,
            LagPolicyArg::PreviousRow => LagPolicy::PreviousRow,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct TrainArgs {
    /// Municipal education CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Where to write the model artifact (defaults to the configured path)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// L2 penalty applied to standardized coefficients
    #[arg(long, default_value_t = 1.0)]
    pub(crate) penalty: f64,
    /// How lag features bridge missing years
    #[arg(long, value_enum, default_value_t = LagPolicyArg::AdjacentYear)]
    pub(crate) lag_policy: LagPolicyArg,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Municipality name; accents and case are ignored
    #[arg(long)]
    pub(crate) municipality: String,
    /// Forecast year (defaults to the configured target year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Scenario adjustment as feature=value; may be repeated
    #[arg(long, value_parser = parse_adjustment)]
    pub(crate) adjust: Vec<(String, f64)>,
    /// Model artifact to load (defaults to the configured path)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyticsArgs {
    #[command(subcommand)]
    pub(crate) view: AnalyticsView,
    /// Model artifact to load (defaults to the configured path)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AnalyticsView {
    /// Latest-year national figures
    National,
    /// Latest-year figures per department, highest dropout first
    Departments,
    /// Yearly figures, optionally for one department
    Trends {
        #[arg(long)]
        department_code: Option<i64>,
    },
}

pub(crate) fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let TrainArgs {
        csv,
        output,
        penalty,
        lag_policy,
    } = args;
    let config = AppConfig::load()?;
    let output = output.unwrap_or(config.model.artifact_path);

    let raw = MunicipalDatasetImporter::from_path(&csv)?;
    let engineer = FeatureEngineer::with_lag_policy(lag_policy.into());
    let artifact = ModelArtifact::train(&engineer, &RidgeTrainer { penalty }, &raw)?;
    artifact.save(&output)?;

    println!("Dropout model trained");
    println!(
        "Rows: {} imported, {} used for fitting (lag policy {:?})",
        artifact.history.len(),
        artifact.training_rows,
        engineer.lag_policy()
    );
    println!("Trained at: {}", artifact.trained_at);
    println!("Artifact: {}", output.display());

    println!("\nFeature importance");
    for (name, share) in artifact.model.feature_importance() {
        println!("- {}: {:.1}%", name, share * 100.0);
    }

    Ok(())
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        municipality,
        year,
        adjust,
        model,
    } = args;
    let config = AppConfig::load()?;
    let artifact = ModelArtifact::load(model.unwrap_or(config.model.artifact_path))?;
    let service = ForecastService::from_artifact(artifact);

    let overrides: Overrides = adjust.into_iter().collect();
    let target_year = year.unwrap_or(config.model.default_target_year);
    let prediction = service.predict(&municipality, target_year, &overrides)?;

    println!(
        "Forecast for {} (department {}), {}",
        prediction.entity_name, prediction.department_code, prediction.target_year
    );
    println!(
        "Predicted dropout rate: {:.2}% (~{} students)",
        prediction.predicted_rate, prediction.predicted_students_impacted
    );

    println!("\nInputs");
    for (name, value) in prediction.features.iter() {
        let marker = if overrides.contains_key(name.key()) { " (adjusted)" } else { "" };
        println!("- {}: {:.2} {}{}", name.key(), value, name.unit(), marker);
    }

    Ok(())
}

pub(crate) fn run_analytics(args: AnalyticsArgs) -> Result<(), AppError> {
    let AnalyticsArgs { view, model } = args;
    let config = AppConfig::load()?;
    let artifact = ModelArtifact::load(model.unwrap_or(config.model.artifact_path))?;
    let engine = AnalyticsEngine::new(Arc::new(artifact.history));

    match view {
        AnalyticsView::National => {
            let national = engine.national();
            println!("National dropout, {}", national.current_year);
            println!(
                "Rate {:.2}% (previous {:.2}%, change {:+.2}, {})",
                national.dropout_rate,
                national.previous_year_dropout,
                national.year_over_year_change,
                national.trend.label()
            );
            println!(
                "Students aged 5-16: {} | Funnel efficiency {:.2}",
                national.total_students, national.funnel_efficiency
            );
        }
        AnalyticsView::Departments => {
            println!("Departments by dropout rate");
            for department in engine.departments() {
                println!(
                    "- {} ({}): {:.2}% [{}], {} municipalities, {} students",
                    department.name,
                    department.code,
                    department.dropout_rate,
                    department.risk_level.label(),
                    department.municipality_count,
                    department.student_count
                );
            }
        }
        AnalyticsView::Trends { department_code } => {
            match department_code {
                Some(code) => println!("Dropout trend for department {code}"),
                None => println!("National dropout trend"),
            }
            let trends = engine.historical_trends(department_code);
            if trends.is_empty() {
                println!("No rows match");
            }
            for trend in trends {
                println!(
                    "- {}: {:.2}% of {} students, funnel {:.2}",
                    trend.year, trend.dropout_rate, trend.students, trend.funnel_ratio
                );
            }
        }
    }

    Ok(())
}
