//! Command-line parsing for the econlab client.
//!
//! Argument parsing and command dispatch stay separate from the
//! configuration/rendering core.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelType;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "econlab", version, about = "Econometric analysis client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and login options shared by every command.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Analysis service URL (overrides ECONLAB_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (overrides ECONLAB_TIMEOUT_SECS).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Login name (overrides ECONLAB_USER).
    #[arg(short = 'u', long, global = true)]
    pub user: Option<String>,

    /// Login password (overrides ECONLAB_PASSWORD).
    #[arg(long, global = true)]
    pub password: Option<String>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a CSV dataset and print its analysis id.
    Upload(UploadArgs),
    /// Show dataset metadata, the variable catalog and an optional preview.
    Show(ShowArgs),
    /// Configure a model, run the estimation and print the results.
    Run(RunArgs),
    /// Export a saved result JSON as a PDF report.
    Export(ExportArgs),
    /// Launch the interactive dashboard.
    Tui(TuiArgs),
}

#[derive(Debug, Args, Clone)]
pub struct UploadArgs {
    /// CSV file to upload. Without it, pick one from the current directory.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Analysis id returned by `econlab upload`.
    pub id: String,

    /// Print the first N preview rows.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub preview: usize,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Analysis id returned by `econlab upload`.
    pub id: String,

    /// Model type (defaults to the dataset's suggested model).
    #[arg(short = 'm', long, value_enum)]
    pub model: Option<ModelType>,

    /// Dependent variable (Y).
    #[arg(short = 'y', long = "dependent", value_name = "COLUMN")]
    pub dependent: String,

    /// Independent variable (X); repeat or comma-separate for several.
    #[arg(short = 'x', long = "independent", value_name = "COLUMN", value_delimiter = ',', required = true)]
    pub independent: Vec<String>,

    /// Entity column (panel models).
    #[arg(long, value_name = "COLUMN")]
    pub entity: Option<String>,

    /// Time column (panel and ARIMA models).
    #[arg(long, value_name = "COLUMN")]
    pub time: Option<String>,

    /// Write the raw result JSON to this file.
    #[arg(long, value_name = "JSON")]
    pub save: Option<PathBuf>,

    /// Export the PDF report into this directory.
    #[arg(long, value_name = "DIR")]
    pub report: Option<PathBuf>,

    /// Export every diagnostic chart as PNG into this directory.
    #[arg(long, value_name = "DIR")]
    pub charts: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Result JSON written by `econlab run --save`.
    #[arg(long, value_name = "JSON")]
    pub result: PathBuf,

    /// Output directory for the report.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Analysis id to open.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub id: Option<String>,

    /// Upload this CSV first and open the new analysis.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Directory for exported reports and charts.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_repeated_and_delimited_independents() {
        let cli = Cli::parse_from([
            "econlab", "run", "a1", "-y", "gdp", "-x", "inflation,unemployment", "-x", "rate",
            "--model", "panel", "--entity", "country_id", "--time", "year",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.independent, vec!["inflation", "unemployment", "rate"]);
        assert_eq!(args.model, Some(ModelType::Panel));
        assert_eq!(args.entity.as_deref(), Some("country_id"));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["econlab", "show", "a1", "--api-url", "http://svc:9000", "-u", "admin"]);
        assert_eq!(cli.global.api_url.as_deref(), Some("http://svc:9000"));
        assert_eq!(cli.global.user.as_deref(), Some("admin"));
    }

    #[test]
    fn tui_needs_id_or_file() {
        assert!(Cli::try_parse_from(["econlab", "tui"]).is_err());
        assert!(Cli::try_parse_from(["econlab", "tui", "a1"]).is_ok());
        assert!(Cli::try_parse_from(["econlab", "tui", "--file", "data.csv"]).is_ok());
    }
}
