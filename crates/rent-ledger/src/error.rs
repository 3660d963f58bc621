use crate::config::ConfigError;
use crate::leasing::accounting::LedgerError;
use crate::leasing::problems::ProblemError;
use crate::leasing::repository::StoreError;
use crate::leasing::tenancy::TenancyError;
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
    Tenancy(TenancyError),
    Ledger(LedgerError),
    Problem(ProblemError),
    Store(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Tenancy(err) => write!(f, "tenancy error: {}", err),
            AppError::Ledger(err) => write!(f, "ledger error: {}", err),
            AppError::Problem(err) => write!(f, "problem error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
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
            AppError::Tenancy(err) => Some(err),
            AppError::Ledger(err) => Some(err),
            AppError::Problem(err) => Some(err),
            AppError::Store(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Tenancy(TenancyError::Store(err)) => store_status(err),
            AppError::Tenancy(TenancyError::UnknownUnit) => StatusCode::NOT_FOUND,
            AppError::Tenancy(_) => StatusCode::BAD_REQUEST,
            AppError::Ledger(LedgerError::Store(err)) => store_status(err),
            AppError::Ledger(LedgerError::DanglingUnit(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Problem(ProblemError::Store(err)) => store_status(err),
            AppError::Problem(ProblemError::UnknownUnit) => StatusCode::NOT_FOUND,
            AppError::Store(err) => store_status(err),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
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

impl From<TenancyError> for AppError {
    fn from(value: TenancyError) -> Self {
        Self::Tenancy(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<ProblemError> for AppError {
    fn from(value: ProblemError) -> Self {
        Self::Problem(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
