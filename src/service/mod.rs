//! Remote analysis service.
//!
//! The dashboard talks to the service only through `AnalysisService`, so the
//! session logic can be driven by an in-memory fake in tests and the HTTP
//! client (`http::ApiClient`) stays a thin transport.

use std::path::Path;

use crate::domain::{AnalysisRecord, AnalysisResult, DatasetMetadata};
use crate::error::ClientError;
use crate::request::AnalysisRequest;

pub mod http;

pub use http::ApiClient;

pub trait AnalysisService {
    /// `GET /api/analysis/{id}`.
    fn fetch_analysis(&self, analysis_id: &str) -> Result<AnalysisRecord, ClientError>;

    /// `POST /api/analyze`.
    fn run_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ClientError>;

    /// `POST /api/export/pdf`; returns the PDF bytes.
    fn export_pdf(&self, result: &AnalysisResult) -> Result<Vec<u8>, ClientError>;

    /// `POST /api/export/png`; returns the PNG bytes for one chart payload.
    fn export_chart_png(&self, chart_base64: &str) -> Result<Vec<u8>, ClientError>;

    /// `POST /api/upload-csv`; returns the stored dataset's metadata.
    fn upload_csv(&self, path: &Path) -> Result<DatasetMetadata, ClientError>;
}
