//! HTTP client for the analysis service API.

use std::path::Path;

use reqwest::blocking::{multipart, Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{AnalysisRecord, AnalysisResult, DatasetMetadata};
use crate::error::ClientError;
use crate::request::AnalysisRequest;
use crate::service::AnalysisService;
use crate::settings::ClientSettings;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_base: String,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ClientError::MetadataLoadFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: api_base(&settings.api_url),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn fetch_bytes(resp: Response) -> Result<Vec<u8>, String> {
        let resp = check_status(resp)?;
        let bytes = resp.bytes().map_err(|e| format!("failed to read response body: {e}"))?;
        Ok(bytes.to_vec())
    }
}

impl AnalysisService for ApiClient {
    fn fetch_analysis(&self, analysis_id: &str) -> Result<AnalysisRecord, ClientError> {
        let url = self.url(&format!("analysis/{analysis_id}"));
        debug!(%url, "fetching analysis metadata");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ClientError::MetadataLoadFailed(format!("request failed: {e}")))?;
        let resp = check_status(resp).map_err(ClientError::MetadataLoadFailed)?;
        let record: AnalysisRecord = resp
            .json()
            .map_err(|e| ClientError::MetadataLoadFailed(format!("invalid metadata payload: {e}")))?;

        info!(
            analysis_id,
            file = %record.metadata.filename,
            rows = record.metadata.rows,
            columns = record.metadata.columns.len(),
            "analysis metadata loaded"
        );
        Ok(record)
    }

    fn run_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ClientError> {
        info!(
            analysis_id = request.analysis_id(),
            model = %request.model_type(),
            dependent = request.dependent_var(),
            independents = request.independent_vars().len(),
            "submitting estimation request"
        );

        let resp = self
            .client
            .post(self.url("analyze"))
            .json(request)
            .send()
            .map_err(|e| ClientError::EstimationFailed(format!("request failed: {e}")))?;
        let resp = check_status(resp).map_err(ClientError::EstimationFailed)?;
        let result: AnalysisResult = resp
            .json()
            .map_err(|e| ClientError::EstimationFailed(format!("invalid result payload: {e}")))?;

        info!(
            coefficients = result.coefficients.len(),
            statistics = result.statistics.len(),
            charts = result.charts.len(),
            "estimation completed"
        );
        Ok(result)
    }

    fn export_pdf(&self, result: &AnalysisResult) -> Result<Vec<u8>, ClientError> {
        debug!("requesting PDF report");
        let resp = self
            .client
            .post(self.url("export/pdf"))
            .json(result)
            .send()
            .map_err(|e| ClientError::ExportFailed(format!("request failed: {e}")))?;
        Self::fetch_bytes(resp).map_err(ClientError::ExportFailed)
    }

    fn export_chart_png(&self, chart_base64: &str) -> Result<Vec<u8>, ClientError> {
        debug!("requesting chart PNG");
        let resp = self
            .client
            .post(self.url("export/png"))
            .json(&serde_json::json!({ "chart": chart_base64 }))
            .send()
            .map_err(|e| ClientError::ExportFailed(format!("request failed: {e}")))?;
        Self::fetch_bytes(resp).map_err(ClientError::ExportFailed)
    }

    fn upload_csv(&self, path: &Path) -> Result<DatasetMetadata, ClientError> {
        info!(path = %path.display(), "uploading dataset");
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|e| ClientError::UploadFailed(format!("failed to read '{}': {e}", path.display())))?;

        let resp = self
            .client
            .post(self.url("upload-csv"))
            .multipart(form)
            .send()
            .map_err(|e| ClientError::UploadFailed(format!("request failed: {e}")))?;
        let resp = check_status(resp).map_err(ClientError::UploadFailed)?;
        let metadata: DatasetMetadata = resp
            .json()
            .map_err(|e| ClientError::UploadFailed(format!("invalid upload response: {e}")))?;

        if metadata.id.is_none() {
            return Err(ClientError::UploadFailed(
                "upload response did not include an analysis id".to_string(),
            ));
        }
        Ok(metadata)
    }
}

/// Service root plus the `/api` prefix, without a trailing slash.
fn api_base(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pass 2xx responses through; otherwise return the service's `detail`.
fn check_status(resp: Response) -> Result<Response, String> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = error_message(status.as_u16(), &body);
    warn!(status = status.as_u16(), %message, "service returned an error");
    Err(message)
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) if !detail.trim().is_empty() => detail,
        _ => format!("request failed with status {status}"),
    }
}
