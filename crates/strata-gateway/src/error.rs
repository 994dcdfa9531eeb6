//! Error handling for the gateway.
//!
//! Two distinct error families, matching the split the core draws between
//! request-time and startup-time failure (§7): `GatewayError` is returned
//! from request handlers and has an `IntoResponse` mapping; `ConfigurationError`
//! is returned from the fallible constructors of the façade and the three
//! services and is fatal at startup — callers should `expect`/exit on it,
//! never recover from it at request time.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced from request handlers.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required body field was missing. Carries the literal message the
    /// API façade contract specifies.
    #[error("'{field}' is a required field but was not found in the request data body")]
    BadRequest { field: String },

    #[error("driver error: {0}")]
    Driver(#[from] strata_core::DriverError),

    #[error("driver task error: {0}")]
    DriverTask(#[from] strata_core::DriverTaskError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::BadRequest { field: field.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Driver(_) => StatusCode::BAD_GATEWAY,
            GatewayError::DriverTask(strata_core::DriverTaskError::InfrastructureNotFoundError(_))
            | GatewayError::DriverTask(strata_core::DriverTaskError::InfrastructureRequestNotFoundError(_)) => {
                StatusCode::NOT_FOUND
            }
            GatewayError::DriverTask(strata_core::DriverTaskError::TemporaryInfrastructureError(_))
            | GatewayError::DriverTask(strata_core::DriverTaskError::UnreachableDeploymentLocationError(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::DriverTask(strata_core::DriverTaskError::Other(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::BadRequest { .. } => "bad_request",
            GatewayError::Driver(_) => "driver_error",
            GatewayError::DriverTask(_) => "driver_task_error",
            GatewayError::Internal(_) => "internal_error",
            GatewayError::Io(_) => "io_error",
        }
    }

    pub fn should_log(&self) -> bool {
        !matches!(self, GatewayError::BadRequest { .. })
    }
}

/// Standardized error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let message = self.to_string();

        if self.should_log() {
            error!(error = %self, status_code = %status, error_type, "gateway error occurred");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            timestamp: chrono::Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

/// Construction-time failures from the façade and core services: a
/// required collaborator was never wired. Fatal at startup; never
/// constructed or matched on at request time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("driver argument not provided")]
    DriverNotProvided,

    #[error("infrastructure_config argument not provided")]
    InfrastructureConfigNotProvided,

    #[error("inf_monitor_service argument not provided (required when async_messaging_enabled is True)")]
    MonitorServiceNotProvided,

    #[error("request_queue argument not provided (required when async_requests_enabled is True)")]
    RequestQueueNotProvided,

    #[error("job_queue_service argument not provided")]
    JobQueueServiceNotProvided,

    #[error("inf_messaging_service argument not provided")]
    MessagingServiceNotProvided,

    #[error("postal_service argument not provided")]
    PostalServiceNotProvided,

    #[error("topics_configuration argument not provided")]
    TopicsConfigurationNotProvided,

    #[error("infrastructure_task_events topic must be set")]
    InfrastructureTaskEventsTopicNotSet,

    #[error("infrastructure_task_events topic name must be set")]
    InfrastructureTaskEventsTopicNameNotSet,
}

/// Per-call argument validation on `TaskMonitoringService::monitor_task`,
/// distinct from construction-time `ConfigurationError` — this one *is*
/// reachable at request time, from the synchronous-dispatch path of the
/// Infrastructure Service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot monitor task when {0} is not given")]
pub struct MonitorArgMissing(pub &'static str);
