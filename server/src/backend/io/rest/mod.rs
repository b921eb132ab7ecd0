//! # REST API Interface Layer
//!
//! HTTP endpoints for the gift ledger. Handlers translate `shared` DTOs into
//! domain commands, call one service, and map the result back. Domain errors
//! become status codes in `error_response`; nothing here makes business
//! decisions.
//!
//! The calling parent is identified by the `x-parent-id` header.

pub mod approval_apis;
pub mod catalog_apis;
pub mod family_apis;
pub mod fulfillment_apis;
pub mod gift_request_apis;
pub mod mappers;
pub mod policy_apis;
pub mod wallet_apis;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;
use tracing::warn;

use crate::backend::domain::errors::LedgerError;

pub const PARENT_ID_HEADER: &str = "x-parent-id";

/// HTTP status for each domain failure
pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Unauthenticated => StatusCode::UNAUTHORIZED,
        LedgerError::Forbidden(_) => StatusCode::FORBIDDEN,
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InsufficientPoints { .. }
        | LedgerError::InsufficientFunds { .. }
        | LedgerError::WindowClosed(_)
        | LedgerError::LimitExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::InvalidState(_) | LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error body for a failed operation. Storage details stay in the log.
pub fn error_response(err: &LedgerError) -> Response {
    let message = match err {
        LedgerError::Storage(_) => "Internal storage error".to_string(),
        other => other.to_string(),
    };
    let body = ErrorResponse {
        code: err.code().to_string(),
        error: message,
    };
    (status_for(err), Json(body)).into_response()
}

/// The parent on whose behalf the request is made
#[derive(Debug, Clone)]
pub struct ParentIdentity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ParentIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let parent_id = parts
            .headers
            .get(PARENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match parent_id {
            Some(id) => Ok(ParentIdentity(id.to_string())),
            None => {
                warn!("Rejected {} {}: missing {} header", parts.method, parts.uri, PARENT_ID_HEADER);
                Err(error_response(&LedgerError::Unauthenticated))
            }
        }
    }
}
