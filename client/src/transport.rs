//! # Transport Seam
//!
//! This module defines the transport abstraction that separates the API
//! client from the actual HTTP stack. The backend is a single endpoint that
//! understands two verbs: GET with url-encoded query parameters and POST
//! with a JSON body; every other detail (which operation runs, which entity
//! is affected) travels in the `action` parameter or field.
//!
//! Tests substitute an in-memory implementation so the endpoint layer can be
//! exercised without a network.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiError;

/// Trait defining the network boundary for the single backend endpoint.
///
/// Implementations only move bytes: interpreting the JSON (including
/// server-reported errors inside a 200 response) is the API client's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET against the endpoint with the given query parameters.
    async fn get(&self, params: &[(String, String)]) -> Result<Value, ApiError>;

    /// Perform a POST against the endpoint with the given JSON body.
    async fn post(&self, body: &Value) -> Result<Value, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, params: &[(String, String)]) -> Result<Value, ApiError> {
        (**self).get(params).await
    }

    async fn post(&self, body: &Value) -> Result<Value, ApiError> {
        (**self).post(body).await
    }
}

/// reqwest-backed transport against one remote endpoint URL.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint_url: String,
}

impl HttpTransport {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint_url: endpoint_url.into(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, params: &[(String, String)]) -> Result<Value, ApiError> {
        let response = self
            .http
            .get(&self.endpoint_url)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post(&self, body: &Value) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(&self.endpoint_url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
