//! Runtime settings resolved from `.env`, the environment, and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::CredentialTable;
use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Service root; `/api` is appended when missing.
    pub api_url: String,
    pub timeout: Duration,
    /// Login policy. `None` disables the login check.
    pub credentials: Option<CredentialTable>,
    pub login: Option<(String, String)>,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credentials: None,
            login: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: None,
        }
    }
}

impl ClientSettings {
    /// Load `.env` (if present) and read `ECONLAB_*` variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Self::default();

        if let Some(url) = non_empty(lookup("ECONLAB_API_URL")) {
            settings.api_url = url;
        }
        if let Some(raw) = non_empty(lookup("ECONLAB_TIMEOUT_SECS")) {
            let secs: u64 = raw.parse().map_err(|_| {
                AppError::new(2, format!("Invalid ECONLAB_TIMEOUT_SECS '{raw}': expected whole seconds."))
            })?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = non_empty(lookup("ECONLAB_CREDENTIALS")) {
            settings.credentials = Some(CredentialTable::parse(&raw)?);
        }
        if let (Some(user), Some(password)) = (
            non_empty(lookup("ECONLAB_USER")),
            lookup("ECONLAB_PASSWORD"),
        ) {
            settings.login = Some((user, password));
        }
        if let Some(filter) = non_empty(lookup("ECONLAB_LOG")) {
            settings.log_filter = filter;
        }
        settings.log_file = non_empty(lookup("ECONLAB_LOG_FILE")).map(PathBuf::from);

        Ok(settings)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
