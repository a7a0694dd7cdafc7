//! API client for the spreadsheet-backed endpoint.
//!
//! Thin wrapper over the [`Transport`] seam: builds the `action` query
//! parameters for reads, serializes the tagged [`ApiRequest`] body for
//! writes, and decodes the JSON the backend answers with. List, create and
//! delete actions answer with an array of rows; `getFullSummary` answers
//! with a summary object. A JSON object carrying an `error` field is a
//! server-reported failure even when the transport succeeded.

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use shared::{ApiRequest, FullSummary, Period, ValidationError};

use crate::transport::Transport;

/// Errors surfaced by the API/endpoint layer.
///
/// The cache is never written on any of these: a failed operation leaves the
/// last-known-good bucket in place and the error propagates to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network unreachable, DNS failure, timeout.
    #[error("network error: {0}")]
    Transport(String),
    /// The response body did not parse as the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
    /// The backend answered with a non-success payload.
    #[error("server error: {0}")]
    Server(String),
    /// Client-side validation failed; no network call was made.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Typed client for the single backend endpoint.
pub struct ApiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// GET a list action, optionally filtered to one period, decoding the
    /// returned array of rows.
    pub async fn get_rows<D: DeserializeOwned>(
        &self,
        action: &str,
        period: Option<Period>,
    ) -> Result<Vec<D>, ApiError> {
        debug!("GET {} (period: {:?})", action, period.map(|p| p.to_string()));
        let value = self.transport.get(&Self::query(action, period)).await?;
        Self::check_server_error(&value)?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET the aggregated summary for one period.
    pub async fn get_summary(&self, period: Period) -> Result<FullSummary, ApiError> {
        debug!("GET getFullSummary for {}", period);
        let value = self
            .transport
            .get(&Self::query("getFullSummary", Some(period)))
            .await?;
        Self::check_server_error(&value)?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// POST a mutation, decoding the array of affected rows the backend
    /// answers with.
    pub async fn post_rows<D: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Vec<D>, ApiError> {
        debug!("POST {}", request.action());
        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        let value = self.transport.post(&body).await?;
        Self::check_server_error(&value)?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn query(action: &str, period: Option<Period>) -> Vec<(String, String)> {
        let mut params = vec![("action".to_string(), action.to_string())];
        if let Some(period) = period {
            params.push(("month".to_string(), period.month.to_string()));
            params.push(("year".to_string(), period.year.to_string()));
        }
        params
    }

    fn check_server_error(value: &Value) -> Result<(), ApiError> {
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(ApiError::Server(message.to_string()));
        }
        Ok(())
    }
}
