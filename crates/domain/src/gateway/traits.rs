use async_trait::async_trait;
use thiserror::Error;

use crate::model::Service;

/// Detail reported when the backend could not be reached at all.
pub const UNREACHABLE_DETAIL: &str = "Unable to reach any services";

/// Common result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No response arrived (refused connection, timeout, DNS failure).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The backend answered with anything other than 200.
    #[error("unexpected status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl GatewayError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// The part of the failure that is meant for people: the response body
    /// for status failures, a fixed sentence when nothing answered.
    pub fn detail(&self) -> &str {
        match self {
            GatewayError::Transport(_) => UNREACHABLE_DETAIL,
            GatewayError::Status { detail, .. } => detail,
            GatewayError::Decode(message) | GatewayError::InvalidEndpoint(message) => message,
        }
    }
}

/// Remote collection of service records, mounted at `/api/services`.
#[async_trait]
pub trait ServiceGateway: Send + Sync {
    async fn list_services(&self) -> GatewayResult<Vec<Service>>;
    async fn update_service(&self, service: &Service) -> GatewayResult<()>;
    async fn create_service(&self, service: &Service) -> GatewayResult<()>;
}
