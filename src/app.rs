//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves settings
//! - sets up logging and checks the login policy
//! - dispatches to upload / show / run / export / tui

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::auth::{self, Authenticator, UserIdentity};
use crate::cli::{Cli, Command, ExportArgs, GlobalArgs, RunArgs, ShowArgs, TuiArgs, UploadArgs};
use crate::error::{AppError, ConfigError};
use crate::logging::{self, LogTarget};
use crate::report::{format_dataset_summary, format_preview, format_view};
use crate::service::{AnalysisService, ApiClient};
use crate::session::{Dashboard, SubmitError};
use crate::settings::ClientSettings;

/// Entry point for the `econlab` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = ClientSettings::from_env()?;
    apply_overrides(&mut settings, &cli.global);

    let target = match cli.command {
        Command::Tui(_) => LogTarget::FileOnly,
        _ => LogTarget::Stderr,
    };
    logging::init(&settings.log_filter, target, settings.log_file.as_deref())?;

    let identity = authenticate(&settings)?;
    let client = ApiClient::new(&settings)?;

    match cli.command {
        Command::Upload(args) => handle_upload(&client, args),
        Command::Show(args) => handle_show(&client, args),
        Command::Run(args) => handle_run(&client, args),
        Command::Export(args) => handle_export(&client, args),
        Command::Tui(args) => handle_tui(client, identity, args),
    }
}

/// CLI flags win over the environment.
pub fn apply_overrides(settings: &mut ClientSettings, global: &GlobalArgs) {
    if let Some(url) = &global.api_url {
        settings.api_url = url.clone();
    }
    if let Some(secs) = global.timeout {
        settings.timeout = Duration::from_secs(secs);
    }
    match (&global.user, &global.password) {
        (Some(user), Some(password)) => settings.login = Some((user.clone(), password.clone())),
        (Some(user), None) => {
            let password = settings.login.take().map(|(_, p)| p).unwrap_or_default();
            settings.login = Some((user.clone(), password));
        }
        (None, Some(password)) => {
            if let Some((_, p)) = settings.login.as_mut() {
                *p = password.clone();
            }
        }
        (None, None) => {}
    }
}

fn authenticate(settings: &ClientSettings) -> Result<UserIdentity, AppError> {
    let policy = settings.credentials.as_ref().map(|t| t as &dyn Authenticator);
    let login = settings.login.as_ref().map(|(u, p)| (u.as_str(), p.as_str()));
    let identity = auth::login(policy, login)?;
    if !identity.username.is_empty() {
        info!(user = %identity.username, "logged in");
    }
    Ok(identity)
}

fn handle_upload(client: &ApiClient, args: UploadArgs) -> Result<(), AppError> {
    let path = match args.file {
        Some(path) => crate::cli::picker::validate_dataset_path(&path)?,
        None => crate::cli::picker::prompt_for_dataset()?,
    };
    let metadata = client.upload_csv(&path)?;
    let id = metadata.id.as_deref().unwrap_or_default();

    println!("Uploaded {} ({} rows, {} columns)", metadata.filename, metadata.rows, metadata.columns.len());
    println!("Suggested model: {}", metadata.suggested_model.as_str().to_uppercase());
    println!("Analysis id: {id}");
    Ok(())
}

fn handle_show(client: &ApiClient, args: ShowArgs) -> Result<(), AppError> {
    let dashboard = Dashboard::load(client, &args.id)?;
    print!("{}", format_dataset_summary(dashboard.record(), dashboard.catalog()));
    if args.preview > 0 {
        println!();
        print!("{}", format_preview(dashboard.record(), args.preview));
    }
    Ok(())
}

fn handle_run(client: &ApiClient, args: RunArgs) -> Result<(), AppError> {
    let mut dashboard = Dashboard::load(client, &args.id)?;
    configure(&mut dashboard, &args)?;

    dashboard.submit(client).map_err(|err| match err {
        SubmitError::Invalid(e) => AppError::from(e),
        SubmitError::Busy => AppError::new(4, SubmitError::Busy.to_string()),
    })?;

    let Some(result) = dashboard.result().cloned() else {
        let message = dashboard
            .latest_notice()
            .map(|n| n.message.clone())
            .unwrap_or_else(|| "Analysis failed.".to_string());
        return Err(AppError::new(4, message));
    };

    print!("{}", format_view(dashboard.view()));

    if let Some(path) = &args.save {
        let file = File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, &result)
            .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;
        println!("Result saved to {}", path.display());
    }

    if let Some(dir) = &args.report {
        if let Some(path) = crate::export::export_current(client, Some(&result), dir)? {
            println!("Report saved to {}", path.display());
        }
    }

    if let Some(dir) = &args.charts {
        for name in result.charts.keys() {
            let path = crate::export::export_chart(client, &result, name, dir)?;
            println!("Chart saved to {}", path.display());
        }
    }

    Ok(())
}

/// Apply CLI selections through the same mutators the dashboard uses.
pub fn configure(dashboard: &mut Dashboard, args: &RunArgs) -> Result<(), ConfigError> {
    let config = dashboard.config_mut();
    if let Some(model) = args.model {
        config.set_model_type(model);
    }
    config.set_dependent_var(&args.dependent)?;
    for column in &args.independent {
        if !config.is_independent(column) {
            config.toggle_independent_var(column)?;
        }
    }
    if let Some(entity) = &args.entity {
        config.set_entity_var(entity)?;
    }
    if let Some(time) = &args.time {
        config.set_time_var(time)?;
    }
    config.readiness().map(|_| ())
}

fn handle_export(client: &ApiClient, args: ExportArgs) -> Result<(), AppError> {
    let result = read_result_json(&args.result)?;
    if let Some(path) = crate::export::export_current(client, Some(&result), &args.out)? {
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

fn read_result_json(path: &Path) -> Result<crate::domain::AnalysisResult, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open result JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid result JSON: {e}")))
}

fn handle_tui(client: ApiClient, identity: UserIdentity, args: TuiArgs) -> Result<(), AppError> {
    let analysis_id = match (args.id, args.file) {
        (Some(id), _) => id,
        (None, Some(file)) => {
            let path = crate::cli::picker::validate_dataset_path(&file)?;
            let metadata = client.upload_csv(&path)?;
            metadata
                .id
                .ok_or_else(|| AppError::new(4, "Upload response did not include an analysis id."))?
        }
        (None, None) => return Err(AppError::new(2, "Pass an analysis id or --file.")),
    };
    crate::tui::run(client, identity, analysis_id, args.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisRecord, DatasetMetadata, ModelType};

    fn dashboard() -> Dashboard {
        let record = AnalysisRecord {
            metadata: DatasetMetadata {
                id: Some("a1".to_string()),
                filename: "panel.csv".to_string(),
                rows: 10,
                columns: ["country_id", "year", "gdp", "inflation", "rate"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                suggested_model: ModelType::Linear,
                model_reasoning: String::new(),
            },
            preview: Vec::new(),
        };
        Dashboard::from_record("a1", record)
    }

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["econlab", "run", "a1"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn configure_builds_a_ready_panel_configuration() {
        let mut d = dashboard();
        let args = run_args(&[
            "-m", "panel", "-y", "gdp", "-x", "inflation,rate", "--entity", "country_id", "--time", "year",
        ]);
        configure(&mut d, &args).unwrap();
        assert_eq!(d.config().model_type(), Some(ModelType::Panel));
        assert_eq!(d.config().independent_vars(), ["inflation", "rate"]);
        assert!(d.config().can_submit());
    }

    #[test]
    fn configure_reports_missing_panel_keys() {
        let mut d = dashboard();
        let args = run_args(&["-m", "panel", "-y", "gdp", "-x", "inflation"]);
        assert_eq!(configure(&mut d, &args), Err(ConfigError::MissingPanelKeys));
    }

    #[test]
    fn configure_ignores_duplicate_independents() {
        let mut d = dashboard();
        let args = run_args(&["-y", "gdp", "-x", "rate", "-x", "rate"]);
        configure(&mut d, &args).unwrap();
        assert_eq!(d.config().independent_vars(), ["rate"]);
    }

    #[test]
    fn configure_rejects_dependent_as_independent() {
        let mut d = dashboard();
        let args = run_args(&["-y", "gdp", "-x", "gdp"]);
        assert_eq!(
            configure(&mut d, &args),
            Err(ConfigError::DependentAsIndependent("gdp".to_string()))
        );
    }

    #[test]
    fn flags_override_environment_login() {
        let mut settings = ClientSettings {
            login: Some(("env-user".to_string(), "env-pw".to_string())),
            ..ClientSettings::default()
        };
        let global = GlobalArgs {
            api_url: Some("http://svc:9000".to_string()),
            timeout: Some(5),
            user: Some("cli-user".to_string()),
            password: None,
        };
        apply_overrides(&mut settings, &global);
        assert_eq!(settings.api_url, "http://svc:9000");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.login, Some(("cli-user".to_string(), "env-pw".to_string())));
    }
}
