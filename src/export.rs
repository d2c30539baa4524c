//! Report and chart export.
//!
//! Both exports hand the current payload to the service and write the bytes
//! it returns to a local file. Nothing here touches the displayed result.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::AnalysisResult;
use crate::error::ClientError;
use crate::service::AnalysisService;

pub const REPORT_FILE_NAME: &str = "analise_econometrica.pdf";

/// Export the current result as a PDF report.
///
/// Returns `Ok(None)` without contacting the service when there is no result.
pub fn export_current<S: AnalysisService + ?Sized>(
    service: &S,
    result: Option<&AnalysisResult>,
    out_dir: &Path,
) -> Result<Option<PathBuf>, ClientError> {
    let Some(result) = result else {
        return Ok(None);
    };

    let bytes = service.export_pdf(result)?;
    let path = out_dir.join(REPORT_FILE_NAME);
    write_artifact(&path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "report exported");
    Ok(Some(path))
}

/// Export one named chart of `result` as `<chart>.png` in `out_dir`.
pub fn export_chart<S: AnalysisService + ?Sized>(
    service: &S,
    result: &AnalysisResult,
    chart_name: &str,
    out_dir: &Path,
) -> Result<PathBuf, ClientError> {
    let payload = result
        .charts
        .get(chart_name)
        .ok_or_else(|| ClientError::ExportFailed(format!("no chart named '{chart_name}'")))?;

    let bytes = service.export_chart_png(payload)?;
    let path = out_dir.join(chart_file_name(chart_name));
    write_artifact(&path, &bytes)?;
    info!(path = %path.display(), chart = chart_name, "chart exported");
    Ok(path)
}

/// `Q-Q plot` -> `Q-Q_plot.png`.
pub fn chart_file_name(chart_name: &str) -> String {
    let stem: String = chart_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "chart".to_string() } else { stem };
    format!("{stem}.png")
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), ClientError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ClientError::ExportFailed(format!("failed to create '{}': {e}", parent.display()))
        })?;
    }
    let mut file = File::create(path)
        .map_err(|e| ClientError::ExportFailed(format!("failed to create '{}': {e}", path.display())))?;
    file.write_all(bytes)
        .map_err(|e| ClientError::ExportFailed(format!("failed to write '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use indexmap::IndexMap;

    use super::*;
    use crate::domain::{AnalysisRecord, DatasetMetadata};
    use crate::request::AnalysisRequest;

    #[derive(Default)]
    struct ReportOnly {
        calls: Cell<usize>,
        fail: bool,
    }

    impl AnalysisService for ReportOnly {
        fn fetch_analysis(&self, _: &str) -> Result<AnalysisRecord, ClientError> {
            unreachable!()
        }
        fn run_analysis(&self, _: &AnalysisRequest) -> Result<AnalysisResult, ClientError> {
            unreachable!()
        }
        fn export_pdf(&self, _: &AnalysisResult) -> Result<Vec<u8>, ClientError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(ClientError::ExportFailed("status 500".to_string()))
            } else {
                Ok(b"%PDF-1.4".to_vec())
            }
        }
        fn export_chart_png(&self, chart: &str) -> Result<Vec<u8>, ClientError> {
            Ok(chart.as_bytes().to_vec())
        }
        fn upload_csv(&self, _: &Path) -> Result<DatasetMetadata, ClientError> {
            unreachable!()
        }
    }

    fn result() -> AnalysisResult {
        let mut charts = IndexMap::new();
        charts.insert("Q-Q plot".to_string(), "cXE=".to_string());
        AnalysisResult {
            result_id: Some("r1".to_string()),
            coefficients: Vec::new(),
            statistics: IndexMap::new(),
            charts,
        }
    }

    #[test]
    fn export_without_result_is_a_no_op() {
        let service = ReportOnly::default();
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(export_current(&service, None, dir.path()).unwrap(), None);
        assert_eq!(service.calls.get(), 0);
    }

    #[test]
    fn export_writes_named_report() {
        let service = ReportOnly::default();
        let dir = tempfile::tempdir().unwrap();
        let path = export_current(&service, Some(&result()), dir.path()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), REPORT_FILE_NAME);
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn export_failure_writes_nothing() {
        let service = ReportOnly { fail: true, ..Default::default() };
        let dir = tempfile::tempdir().unwrap();
        let err = export_current(&service, Some(&result()), dir.path()).unwrap_err();
        assert!(matches!(err, ClientError::ExportFailed(_)));
        assert!(!dir.path().join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn chart_export_uses_sanitized_name() {
        let service = ReportOnly::default();
        let dir = tempfile::tempdir().unwrap();
        let path = export_chart(&service, &result(), "Q-Q plot", &dir.path().join("charts")).unwrap();
        assert_eq!(path.file_name().unwrap(), "Q-Q_plot.png");
        assert_eq!(fs::read(&path).unwrap(), b"cXE=");

        let err = export_chart(&service, &result(), "missing", dir.path()).unwrap_err();
        assert!(matches!(err, ClientError::ExportFailed(_)));
    }

    #[test]
    fn chart_file_names() {
        assert_eq!(chart_file_name("diagnostics"), "diagnostics.png");
        assert_eq!(chart_file_name("résumé"), "r_sum_.png");
        assert_eq!(chart_file_name(""), "chart.png");
    }
}
