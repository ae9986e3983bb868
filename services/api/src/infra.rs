use dropout_forecast::analytics::AnalyticsEngine;
use dropout_forecast::error::AppError;
use dropout_forecast::forecast::{ArtifactError, ForecastService, ModelArtifact};
use dropout_forecast::features::HistoricalTable;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read-only services shared by every API handler.
#[derive(Clone)]
pub(crate) struct ApiServices {
    pub(crate) forecasts: Arc<ForecastService>,
    pub(crate) analytics: Arc<AnalyticsEngine>,
    pub(crate) default_target_year: i32,
}

impl ApiServices {
    pub(crate) fn new(forecasts: ForecastService, default_target_year: i32) -> Self {
        let analytics = AnalyticsEngine::new(forecasts.table());
        Self {
            forecasts: Arc::new(forecasts),
            analytics: Arc::new(analytics),
            default_target_year,
        }
    }
}

/// Loads the persisted artifact. A missing file starts the service without a
/// model; an unreadable or mismatched artifact is an error.
pub(crate) fn load_forecast_service(path: &Path) -> Result<ForecastService, AppError> {
    match ModelArtifact::load(path) {
        Ok(artifact) => Ok(ForecastService::from_artifact(artifact)),
        Err(ArtifactError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "model artifact not found; forecasts disabled");
            Ok(ForecastService::new(Arc::new(HistoricalTable::default()), None))
        }
        Err(err) => Err(err.into()),
    }
}

/// `key=value` scenario adjustment from the command line.
pub(crate) fn parse_adjustment(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing feature name in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{value}' as a number ({err})"))?;
    Ok((key.to_string(), value))
}
