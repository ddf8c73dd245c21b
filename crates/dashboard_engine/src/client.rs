use std::time::Duration;

use dashboard_logging::{dash_debug, dash_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::JobDetailBody;
use crate::{ApiError, FailureKind, JobOverview, JobSummary, ListParams};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Scheme, host and port of the dashboard server; any path is kept as a prefix.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:48008".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Calls the dashboard server makes available to the views.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_jobs(
        &self,
        dispatch_id: &str,
        node_id: u64,
        params: &ListParams,
    ) -> Result<Vec<JobSummary>, ApiError>;

    async fn job_overview(
        &self,
        dispatch_id: &str,
        node_id: u64,
        job_id: &str,
    ) -> Result<JobOverview, ApiError>;

    async fn fetch_settings(&self) -> Result<serde_json::Value, ApiError>;

    /// Stores `{partition: {key: value}}`.
    async fn persist_settings(&self, body: &serde_json::Value) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, self.base.to_string()))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    fn jobs_endpoint(&self, dispatch_id: &str, node_id: u64) -> Result<Url, ApiError> {
        let node_id = node_id.to_string();
        self.endpoint(&["dispatches", dispatch_id, "electron", &node_id, "jobs"])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        dash_debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let bytes = checked(response).await?.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            dash_warn!("could not decode response from {}: {}", url, err);
            ApiError::new(FailureKind::Decode, err.to_string())
        })
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn list_jobs(
        &self,
        dispatch_id: &str,
        node_id: u64,
        params: &ListParams,
    ) -> Result<Vec<JobSummary>, ApiError> {
        let mut url = self.jobs_endpoint(dispatch_id, node_id)?;
        url.query_pairs_mut()
            .append_pair("sort_by", &params.sort_by)
            .append_pair("direction", &params.direction)
            .append_pair("offset", &params.offset.to_string());
        self.get_json(url).await
    }

    async fn job_overview(
        &self,
        dispatch_id: &str,
        node_id: u64,
        job_id: &str,
    ) -> Result<JobOverview, ApiError> {
        let mut url = self.jobs_endpoint(dispatch_id, node_id)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, self.base.to_string()))?
            .push(job_id);
        let body: JobDetailBody = self.get_json(url).await?;
        Ok(body.overview)
    }

    async fn fetch_settings(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json(self.endpoint(&["settings"])?).await
    }

    async fn persist_settings(&self, body: &serde_json::Value) -> Result<(), ApiError> {
        let url = self.endpoint(&["settings"])?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        dash_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        checked(response).await?;
        Ok(())
    }
}

async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let detail = response.text().await.unwrap_or_default();
    dash_warn!("{} answered {}", url, status);
    let message = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    };
    Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), message))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
