//! End-to-end session flows against an in-memory analysis service.

use std::cell::RefCell;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use econlab::domain::{AnalysisRecord, AnalysisResult, DatasetMetadata, ModelType};
use econlab::error::{ClientError, ConfigError};
use econlab::export::REPORT_FILE_NAME;
use econlab::report::{RenderedView, format_view};
use econlab::request::AnalysisRequest;
use econlab::service::AnalysisService;
use econlab::session::{Dashboard, NoticeLevel, SubmitError};
use serde_json::json;

struct FakeService {
    columns: Vec<String>,
    suggested: ModelType,
    result: serde_json::Value,
    fail_analyze: bool,
    sent: RefCell<Vec<serde_json::Value>>,
}

impl FakeService {
    fn new(columns: &[&str], result: serde_json::Value) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            suggested: ModelType::Linear,
            result,
            fail_analyze: false,
            sent: RefCell::new(Vec::new()),
        }
    }
}

impl AnalysisService for FakeService {
    fn fetch_analysis(&self, analysis_id: &str) -> Result<AnalysisRecord, ClientError> {
        if analysis_id != "a1" {
            return Err(ClientError::MetadataLoadFailed("Analysis not found".to_string()));
        }
        Ok(AnalysisRecord {
            metadata: DatasetMetadata {
                id: Some("a1".to_string()),
                filename: "macro.csv".to_string(),
                rows: 120,
                columns: self.columns.clone(),
                suggested_model: self.suggested,
                model_reasoning: "No time or entity structure.".to_string(),
            },
            preview: Vec::new(),
        })
    }

    fn run_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ClientError> {
        self.sent.borrow_mut().push(serde_json::to_value(request).unwrap());
        if self.fail_analyze {
            return Err(ClientError::EstimationFailed("Singular matrix".to_string()));
        }
        Ok(serde_json::from_value(self.result.clone()).unwrap())
    }

    fn export_pdf(&self, _result: &AnalysisResult) -> Result<Vec<u8>, ClientError> {
        Ok(b"%PDF-1.4".to_vec())
    }

    fn export_chart_png(&self, chart_base64: &str) -> Result<Vec<u8>, ClientError> {
        STANDARD
            .decode(chart_base64)
            .map_err(|e| ClientError::ExportFailed(e.to_string()))
    }

    fn upload_csv(&self, _path: &Path) -> Result<DatasetMetadata, ClientError> {
        Err(ClientError::UploadFailed("not supported".to_string()))
    }
}

fn linear_result() -> serde_json::Value {
    json!({
        "coefficients": [{
            "variable": "inflation", "coefficient": 0.0321, "std_error": 0.01,
            "t_statistic": 3.21, "p_value": 0.001
        }],
        "statistics": {"r_squared": 0.87, "n_obs": 120},
        "charts": {}
    })
}

#[test]
fn linear_model_round_trip() {
    let service = FakeService::new(&["id", "gdp", "inflation", "year"], linear_result());
    let mut dashboard = Dashboard::load(&service, "a1").unwrap();

    assert_eq!(dashboard.catalog().selectable_columns, ["gdp", "inflation", "year"]);
    assert_eq!(dashboard.config().model_type(), Some(ModelType::Linear));

    dashboard.config_mut().set_dependent_var("gdp").unwrap();
    dashboard.config_mut().toggle_independent_var("inflation").unwrap();
    assert!(dashboard.config().can_submit());

    dashboard.submit(&service).unwrap();
    assert!(!dashboard.is_busy());

    let sent = service.sent.borrow();
    assert_eq!(
        sent[0],
        json!({
            "analysis_id": "a1",
            "model_type": "linear",
            "dependent_var": "gdp",
            "independent_vars": ["inflation"],
            "entity_var": null,
            "time_var": null,
            "arima_order": [1, 1, 1]
        })
    );

    let RenderedView::Results(view) = dashboard.view() else {
        panic!("expected results");
    };
    assert_eq!(view.coefficients.len(), 1);
    assert!(view.coefficients[0].significant);
    assert_eq!(view.coefficients[0].p_value, "0.0010");

    let tiles: Vec<(&str, &str)> = view
        .statistics
        .iter()
        .map(|t| (t.label.as_str(), t.value.as_str()))
        .collect();
    assert_eq!(tiles, [("R SQUARED", "0.8700"), ("N OBS", "120")]);

    assert!(view.charts.is_empty());
    assert!(view.charts.active().is_none());
    assert!(format_view(dashboard.view()).contains("inflation"));
}

#[test]
fn panel_without_entity_is_never_sent() {
    let service = FakeService::new(&["country_id", "year", "gdp", "inflation"], linear_result());
    let mut dashboard = Dashboard::load(&service, "a1").unwrap();
    let config = dashboard.config_mut();
    config.set_model_type(ModelType::Panel);
    config.set_dependent_var("gdp").unwrap();
    config.toggle_independent_var("inflation").unwrap();
    config.set_time_var("year").unwrap();

    assert!(!dashboard.config().can_submit());
    assert_eq!(
        dashboard.submit(&service),
        Err(SubmitError::Invalid(ConfigError::MissingPanelKeys))
    );
    assert!(service.sent.borrow().is_empty());
    assert!(matches!(dashboard.view(), RenderedView::Placeholder));

    // Identifier columns are hidden from variables but stay valid keys.
    dashboard.config_mut().set_entity_var("country_id").unwrap();
    dashboard.submit(&service).unwrap();
    let sent = service.sent.borrow();
    assert_eq!(sent[0]["entity_var"], "country_id");
    assert_eq!(sent[0]["time_var"], "year");
}

#[test]
fn failed_estimation_keeps_the_placeholder_and_reports() {
    let mut service = FakeService::new(&["gdp", "inflation"], linear_result());
    service.fail_analyze = true;
    let mut dashboard = Dashboard::load(&service, "a1").unwrap();
    dashboard.config_mut().set_dependent_var("gdp").unwrap();
    dashboard.config_mut().toggle_independent_var("inflation").unwrap();

    dashboard.submit(&service).unwrap();
    assert!(!dashboard.is_busy());
    assert!(dashboard.result().is_none());
    let notice = dashboard.latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("Singular matrix"));
}

#[test]
fn unknown_analysis_fails_to_load() {
    let service = FakeService::new(&["gdp"], linear_result());
    let err = Dashboard::load(&service, "missing").unwrap_err();
    assert!(err.to_string().contains("Analysis not found"));
}

#[test]
fn exports_write_report_and_charts() {
    let png = STANDARD.encode(b"\x89PNG\r\n\x1a\nrest");
    let mut payload = linear_result();
    payload["charts"] = json!({"residuals": png, "Q-Q plot": "%%%"});

    let service = FakeService::new(&["gdp", "inflation"], payload);
    let mut dashboard = Dashboard::load(&service, "a1").unwrap();
    let dir = tempfile::tempdir().unwrap();

    // Nothing to export yet.
    assert_eq!(dashboard.export_report(&service, dir.path()), None);

    dashboard.config_mut().set_dependent_var("gdp").unwrap();
    dashboard.config_mut().toggle_independent_var("inflation").unwrap();
    dashboard.submit(&service).unwrap();

    let report = dashboard.export_report(&service, dir.path()).unwrap();
    assert_eq!(report, dir.path().join(REPORT_FILE_NAME));
    assert_eq!(std::fs::read(&report).unwrap(), b"%PDF-1.4");

    let result = dashboard.result().unwrap();
    let chart = econlab::export::export_chart(&service, result, "residuals", dir.path()).unwrap();
    assert_eq!(std::fs::read(chart).unwrap(), b"\x89PNG\r\n\x1a\nrest");

    // An undecodable chart still renders as a tab.
    let RenderedView::Results(view) = dashboard.view() else {
        panic!("expected results");
    };
    assert_eq!(view.charts.len(), 2);
}

#[test]
fn second_submission_waits_for_the_first() {
    let service = FakeService::new(&["gdp", "inflation", "rate"], linear_result());
    let mut dashboard = Dashboard::load(&service, "a1").unwrap();
    dashboard.config_mut().set_dependent_var("gdp").unwrap();
    dashboard.config_mut().toggle_independent_var("inflation").unwrap();

    let request = dashboard.begin_submission().unwrap();
    assert!(dashboard.is_busy());
    assert_eq!(dashboard.begin_submission(), Err(SubmitError::Busy));

    // Edits remain possible while the request is outstanding.
    dashboard.config_mut().toggle_independent_var("rate").unwrap();
    assert_eq!(request.independent_vars(), ["inflation"]);

    let outcome = service.run_analysis(&request);
    dashboard.finish_submission(outcome);
    assert!(!dashboard.is_busy());
    assert!(dashboard.can_export());
}
