//! HTTP implementation of the attendance service gateway.

use crate::error::ApiError;
use crate::service::AttendanceService;
use crate::types::{
    AttendanceReport, CsvExport, HealthStatus, ImageBlob, MarkOutcome, RecognitionResult,
    RecognizeResponse, ResetAck,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// Filename used when the server suggests none.
const DEFAULT_EXPORT_FILENAME: &str = "absents.csv";

/// Typed HTTP client for the attendance backend.
///
/// Cheap to clone; all requests share one connection pool. Any non-2xx
/// status, transport failure, or undecodable body becomes an
/// [`ApiError`] — no retry, no backoff.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for the given base origin (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = base_url.trim_end_matches('/');
        reqwest::Url::parse(base).map_err(|e| ApiError::InvalidBaseUrl(format!("{base}: {e}")))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Build the multipart form the backend expects: a single `file`
    /// part carrying the image bytes.
    fn image_form(blob: &ImageBlob) -> Result<Form, ApiError> {
        let part = Part::bytes(blob.bytes.clone())
            .file_name(blob.filename.clone())
            .mime_str(&blob.mime)?;
        Ok(Form::new().part("file", part))
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %resp.url(), "server rejected request");
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(resp)
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::MalformedBody(e.to_string()))
    }
}

#[async_trait]
impl AttendanceService for ApiClient {
    async fn recognize(&self, blob: &ImageBlob) -> Result<Vec<RecognitionResult>, ApiError> {
        if !blob.is_image() {
            tracing::warn!(mime = %blob.mime, "refusing to submit non-image blob");
            return Err(ApiError::NotAnImage(blob.mime.clone()));
        }

        let resp = self
            .http
            .post(self.endpoint("recognize-face"))
            .multipart(Self::image_form(blob)?)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let envelope: RecognizeResponse = Self::decode(resp).await?;
        tracing::debug!(faces = envelope.results.len(), "recognize completed");
        Ok(envelope.results)
    }

    async fn mark_attendance(&self, blob: &ImageBlob) -> Result<MarkOutcome, ApiError> {
        if !blob.is_image() {
            tracing::warn!(mime = %blob.mime, "refusing to submit non-image blob");
            return Err(ApiError::NotAnImage(blob.mime.clone()));
        }

        let resp = self
            .http
            .post(self.endpoint("mark-attendance"))
            .multipart(Self::image_form(blob)?)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let outcome: MarkOutcome = Self::decode(resp).await?;
        tracing::debug!(
            recognized = outcome.recognized.len(),
            newly_added = outcome.newly_added.len(),
            "attendance marked"
        );
        Ok(outcome)
    }

    async fn report(&self) -> Result<AttendanceReport, ApiError> {
        let resp = self.http.get(self.endpoint("attendance-report")).send().await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }

    async fn reset(&self) -> Result<ResetAck, ApiError> {
        let resp = self.http.post(self.endpoint("reset-attendance")).send().await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }

    async fn known_students(&self) -> Result<Vec<String>, ApiError> {
        let resp = self.http.get(self.endpoint("known-students")).send().await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }

    async fn download_absent_csv(&self) -> Result<CsvExport, ApiError> {
        let resp = self
            .http
            .get(self.endpoint("download-absent-csv"))
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        let filename = parse_content_disposition(
            resp.headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = resp.bytes().await?.to_vec();
        tracing::debug!(%filename, size = bytes.len(), "CSV export downloaded");

        Ok(CsvExport { filename, bytes })
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let resp = self.http.get(self.endpoint("health")).send().await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }
}

/// Extract the suggested filename from a `Content-Disposition` header
/// value, falling back to [`DEFAULT_EXPORT_FILENAME`].
fn parse_content_disposition(value: Option<&str>) -> String {
    value
        .and_then(|v| {
            v.split(';')
                .find_map(|part| part.trim().strip_prefix("filename="))
        })
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string())
}
