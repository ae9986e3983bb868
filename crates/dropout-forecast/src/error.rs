use crate::config::ConfigError;
use crate::dataset::DatasetImportError;
use crate::forecast::{ArtifactError, ForecastError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Dataset(DatasetImportError),
    Artifact(ArtifactError),
    Forecast(ForecastError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Forecast(ForecastError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Forecast(ForecastError::ModelUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Forecast(ForecastError::MissingFeature { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Forecast(ForecastError::Predictor(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Dataset(_)
            | AppError::Artifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Dataset(err) => write!(f, "dataset error: {}", err),
            AppError::Artifact(err) => write!(f, "model error: {}", err),
            AppError::Forecast(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Dataset(err) => Some(err),
            AppError::Artifact(err) => Some(err),
            AppError::Forecast(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DatasetImportError> for AppError {
    fn from(value: DatasetImportError) -> Self {
        Self::Dataset(value)
    }
}

impl From<ArtifactError> for AppError {
    fn from(value: ArtifactError) -> Self {
        Self::Artifact(value)
    }
}

impl From<ForecastError> for AppError {
    fn from(value: ForecastError) -> Self {
        Self::Forecast(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureName;

    #[test]
    fn forecast_errors_map_to_client_statuses() {
        assert_eq!(
            AppError::from(ForecastError::not_found("Atlantis")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ForecastError::ModelUnavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let missing = ForecastError::MissingFeature {
            entity: "Palmira".to_string(),
            feature: FeatureName::ClassroomDensity,
        };
        assert_eq!(AppError::from(missing).status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(AppError::from(io).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_message_names_the_query() {
        let error = AppError::from(ForecastError::not_found("Atlantis"));
        assert_eq!(error.to_string(), "municipality 'Atlantis' not found");
    }
}
