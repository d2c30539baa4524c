//! `econlab` library crate.
//!
//! The binary (`econlab`) is a thin wrapper around this library so that:
//!
//! - the configuration and rendering core is testable without a terminal
//! - the analysis service sits behind a trait and can be faked in tests
//! - the CLI and the TUI drive the same session state

pub mod app;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod logging;
pub mod report;
pub mod request;
pub mod service;
pub mod session;
pub mod settings;
pub mod tui;
