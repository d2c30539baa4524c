//! Dashboard session: one analysis id, its configuration and last result.
//!
//! The session owns all mutable dashboard state. Front-ends drive it with
//! edits, a two-phase submission (`begin_submission` / `finish_submission`)
//! and exports. Remote failures become notices; nothing here panics on a
//! service error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::VariableCatalog;
use crate::config::AnalysisConfig;
use crate::domain::{AnalysisRecord, AnalysisResult};
use crate::error::{ClientError, ConfigError};
use crate::report::{render, RenderedView};
use crate::request::AnalysisRequest;
use crate::service::AnalysisService;

const MAX_NOTICES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub at: DateTime<Local>,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("An analysis is already running.")]
    Busy,
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    analysis_id: String,
    record: AnalysisRecord,
    config: AnalysisConfig,
    result: Option<AnalysisResult>,
    view: RenderedView,
    busy: bool,
    notices: Vec<Notice>,
}

impl Dashboard {
    /// Fetch metadata and open a session seeded with the suggested model.
    pub fn load<S: AnalysisService + ?Sized>(service: &S, analysis_id: &str) -> Result<Self, ClientError> {
        let record = service.fetch_analysis(analysis_id)?;
        Ok(Self::from_record(analysis_id, record))
    }

    pub fn from_record(analysis_id: &str, record: AnalysisRecord) -> Self {
        let catalog = VariableCatalog::resolve(&record.metadata);
        Self {
            analysis_id: analysis_id.to_string(),
            record,
            config: AnalysisConfig::seeded(catalog),
            result: None,
            view: RenderedView::Placeholder,
            busy: false,
            notices: Vec::new(),
        }
    }

    pub fn analysis_id(&self) -> &str {
        &self.analysis_id
    }

    pub fn record(&self) -> &AnalysisRecord {
        &self.record
    }

    pub fn catalog(&self) -> &VariableCatalog {
        self.config.catalog()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Configuration edits stay available while a request is in flight.
    pub fn config_mut(&mut self) -> &mut AnalysisConfig {
        &mut self.config
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn view(&self) -> &RenderedView {
        &self.view
    }

    /// Mutable view, for chart tab selection.
    pub fn view_mut(&mut self) -> &mut RenderedView {
        &mut self.view
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn can_export(&self) -> bool {
        self.result.is_some()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(Notice {
            at: Local::now(),
            level,
            message: message.into(),
        });
    }

    /// Validate, build the request and mark the session busy.
    ///
    /// Rejections are reported as notices too; the session stays idle.
    pub fn begin_submission(&mut self) -> Result<AnalysisRequest, SubmitError> {
        if self.busy {
            return Err(SubmitError::Busy);
        }
        let request = match AnalysisRequest::build(&self.analysis_id, &self.config) {
            Ok(request) => request,
            Err(err) => {
                self.notify(NoticeLevel::Error, err.to_string());
                return Err(err.into());
            }
        };
        self.busy = true;
        Ok(request)
    }

    /// Apply the outcome of the outstanding request and clear the busy flag.
    ///
    /// A success replaces the previous result entirely; a failure keeps it.
    pub fn finish_submission(&mut self, outcome: Result<AnalysisResult, ClientError>) {
        self.busy = false;
        match outcome {
            Ok(result) => {
                info!(analysis_id = %self.analysis_id, "result received");
                self.view = render(Some(&result));
                self.result = Some(result);
                self.notify(NoticeLevel::Info, "Analysis completed.");
            }
            Err(err) => {
                warn!(analysis_id = %self.analysis_id, error = %err, "estimation failed");
                self.notify(NoticeLevel::Error, err.to_string());
            }
        }
    }

    /// Submit and wait for the outcome on the calling thread.
    pub fn submit<S: AnalysisService + ?Sized>(&mut self, service: &S) -> Result<(), SubmitError> {
        let request = self.begin_submission()?;
        let outcome = service.run_analysis(&request);
        self.finish_submission(outcome);
        Ok(())
    }

    /// Export the current result as a PDF into `out_dir`.
    pub fn export_report<S: AnalysisService + ?Sized>(&mut self, service: &S, out_dir: &Path) -> Option<PathBuf> {
        let outcome = crate::export::export_current(service, self.result.as_ref(), out_dir);
        self.record_export(outcome)
    }

    /// Apply an export outcome produced elsewhere (e.g. a worker thread).
    pub fn record_export(&mut self, outcome: Result<Option<PathBuf>, ClientError>) -> Option<PathBuf> {
        match outcome {
            Ok(Some(path)) => {
                self.notify(NoticeLevel::Info, format!("Report saved to {}", path.display()));
                Some(path)
            }
            Ok(None) => None,
            Err(err) => {
                self.notify(NoticeLevel::Error, err.to_string());
                None
            }
        }
    }
}
