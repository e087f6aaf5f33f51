//! Growthbook REST client
//!
//! All calls are `POST`s under `{server_url}/api/v1` with bearer-token auth:
//! - `experiments` / `experiments/{id}` answer `{"experiment": {...}}`
//! - `features` / `features/{id}` bodies are ignored on success
//!
//! Ids are pushed as single percent-encoded path segments, so a slug holding
//! `/` or `?` still addresses one resource.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::ExperimentGateway;
use async_trait::async_trait;
use growthsync_model::{
    CreateExperimentRequest, ExperimentEnvelope, ExperimentPatch, FeatureFlagSpec,
    RemoteExperiment,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// [`ExperimentGateway`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpGateway {
    /// Build a client from configuration
    ///
    /// # Errors
    /// - `GatewayError::NotConfigured` if the API key or server URL is missing or unusable
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GatewayError::NotConfigured("missing API key".to_string()))?;

        let server_url = config.server_url.trim().trim_end_matches('/');
        let mut base_url = reqwest::Url::parse(server_url)
            .map_err(|e| GatewayError::NotConfigured(format!("invalid server url: {e}")))?;
        base_url
            .path_segments_mut()
            .map_err(|()| {
                GatewayError::NotConfigured(format!("server url {server_url} cannot take a path"))
            })?
            .pop_if_empty()
            .extend(API_PREFIX);

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| GatewayError::NotConfigured(format!("invalid API key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::NotConfigured(format!("http client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Endpoint root, including the API prefix
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Endpoint for `segments`, each one percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                GatewayError::NotConfigured(format!("{} cannot take a path", self.base_url))
            })?
            .extend(segments);
        Ok(url)
    }

    /// POST `body`, failing on any non-success status
    async fn post<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = self.url(segments)?;
        let response = self.client.post(url.clone()).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, path = url.path(), "platform rejected request");
        Err(GatewayError::rejected(status.as_u16(), body))
    }

    async fn post_experiment<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<RemoteExperiment, GatewayError> {
        let bytes = self.post(segments, body).await?.bytes().await?;
        let envelope: ExperimentEnvelope = serde_json::from_slice(&bytes)?;
        Ok(envelope.experiment)
    }
}

#[async_trait]
impl ExperimentGateway for HttpGateway {
    #[tracing::instrument(skip(self, request), fields(tracking_key = %request.tracking_key))]
    async fn create_experiment(
        &self,
        request: &CreateExperimentRequest,
    ) -> Result<RemoteExperiment, GatewayError> {
        tracing::debug!(variations = request.variations.len(), "creating experiment");
        self.post_experiment(&["experiments"], request).await
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_experiment(
        &self,
        id: &str,
        patch: &ExperimentPatch,
    ) -> Result<RemoteExperiment, GatewayError> {
        tracing::debug!(status = ?patch.status, "updating experiment");
        self.post_experiment(&["experiments", id], patch).await
    }

    #[tracing::instrument(skip(self, spec), fields(flag_id = ?spec.id))]
    async fn create_feature_flag(&self, spec: &FeatureFlagSpec) -> Result<(), GatewayError> {
        self.post(&["features"], spec).await.map(|_| ())
    }

    #[tracing::instrument(skip(self, spec))]
    async fn update_feature_flag(
        &self,
        id: &str,
        spec: &FeatureFlagSpec,
    ) -> Result<(), GatewayError> {
        self.post(&["features", id], spec).await.map(|_| ())
    }
}
