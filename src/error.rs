//! Error types.
//!
//! `AppError` is what the binary reports: a message plus a process exit code.
//! Library modules return typed errors (`ConfigError`, `ClientError`) that
//! convert into it at the command boundary.
//!
//! Exit codes:
//! - 2: usage, configuration, local I/O
//! - 3: authentication
//! - 4: remote analysis service
//! - 5: invalid model configuration

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Local rejection of a configuration edit or submission
/// (the "configuration invalid" category).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Select a model type before running the analysis.")]
    MissingModelType,

    #[error("Select the dependent variable and at least one independent variable.")]
    MissingVariables,

    #[error("Panel models require both an entity variable and a time variable.")]
    MissingPanelKeys,

    #[error("ARIMA models require a time variable.")]
    MissingTimeVar,

    #[error("Column '{0}' is not selectable as a model variable.")]
    NotSelectable(String),

    #[error("Column '{0}' is not part of the dataset.")]
    UnknownColumn(String),

    #[error("'{0}' is the dependent variable and cannot also be independent.")]
    DependentAsIndependent(String),
}

impl ConfigError {
    /// True for failures about the dependent/independent selection, false for
    /// the model-specific key fields.
    pub fn is_variable_selection(&self) -> bool {
        matches!(self, Self::MissingVariables | Self::MissingModelType)
    }
}

/// Failures talking to the remote analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Failed to load analysis data: {0}")]
    MetadataLoadFailed(String),

    #[error("Analysis failed: {0}")]
    EstimationFailed(String),

    #[error("Report export failed: {0}")]
    ExportFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(5, err.to_string())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::new(4, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_map_to_exit_codes() {
        let config: AppError = ConfigError::MissingPanelKeys.into();
        assert_eq!(config.exit_code(), 5);

        let remote: AppError = ClientError::EstimationFailed("boom".to_string()).into();
        assert_eq!(remote.exit_code(), 4);
        assert_eq!(remote.to_string(), "Analysis failed: boom");
    }

    #[test]
    fn readiness_categories_are_distinguished() {
        assert!(ConfigError::MissingVariables.is_variable_selection());
        assert!(!ConfigError::MissingPanelKeys.is_variable_selection());
        assert!(!ConfigError::MissingTimeVar.is_variable_selection());
    }
}
