//! Backend client.
//!
//! [`HandoverBackend`] is the seam the board talks through; [`HttpBackend`]
//! implements it over HTTP with `reqwest`. Every call is a JSON POST.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::billing::{parse_billing, BillingRecord};
use crate::config::BackendConfig;
use crate::create::CreateTaskPayload;
use crate::error::{Error, Result};
use crate::model::Task;
use crate::session::Session;
use crate::wire::{parse_record_set, parse_task, CredentialsPayload, RecordSet, UpdateTaskPayload};

#[async_trait]
pub trait HandoverBackend: Send + Sync {
    /// Active handovers and their tasks.
    async fn fetch_handovers(&self, session: &Session) -> Result<RecordSet>;

    /// Closed handovers; same shape as [`HandoverBackend::fetch_handovers`].
    async fn fetch_history(&self, session: &Session) -> Result<RecordSet>;

    async fn create_task(&self, payload: &CreateTaskPayload) -> Result<Task>;

    /// Persist an acknowledged task; returns the backend's copy.
    async fn update_task(&self, payload: &UpdateTaskPayload) -> Result<Task>;

    async fn fetch_billing(&self, session: &Session, search: &str) -> Result<Vec<BillingRecord>>;
}

#[derive(Debug, Serialize)]
struct BillingRequest<'a> {
    #[serde(flatten)]
    credentials: CredentialsPayload<'a>,
    search: &'a str,
}

/// HTTP implementation of [`HandoverBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| Error::Network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn post_json<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let url = self.config.url(path);
        tracing::debug!(%url, "backend request");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "backend returned error status");
            return Err(Error::Backend {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let text = resp.text().await.map_err(|err| self.transport_error(err))?;
        tracing::debug!(%url, bytes = text.len(), "backend response");
        serde_json::from_str(&text)
            .map_err(|err| Error::DataShape(format!("{path} returned invalid JSON: {err}")))
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.config.timeout_secs)
        } else {
            Error::Network(err.to_string())
        }
    }
}

#[async_trait]
impl HandoverBackend for HttpBackend {
    async fn fetch_handovers(&self, session: &Session) -> Result<RecordSet> {
        let body = CredentialsPayload::from(session);
        let value = self.post_json(&self.config.endpoints.handovers, &body).await?;
        parse_record_set(&value)
    }

    async fn fetch_history(&self, session: &Session) -> Result<RecordSet> {
        let body = CredentialsPayload::from(session);
        let value = self.post_json(&self.config.endpoints.history, &body).await?;
        parse_record_set(&value)
    }

    async fn create_task(&self, payload: &CreateTaskPayload) -> Result<Task> {
        let value = self.post_json(&self.config.endpoints.create_task, payload).await?;
        parse_task(&value)
    }

    async fn update_task(&self, payload: &UpdateTaskPayload) -> Result<Task> {
        let value = self.post_json(&self.config.endpoints.update_task, payload).await?;
        parse_task(&value)
    }

    async fn fetch_billing(&self, session: &Session, search: &str) -> Result<Vec<BillingRecord>> {
        let body = BillingRequest {
            credentials: CredentialsPayload::from(session),
            search,
        };
        let value = self.post_json(&self.config.endpoints.billing, &body).await?;
        parse_billing(&value)
    }
}
