//! Domain types used throughout the client.
//!
//! This module defines:
//!
//! - model selection (`ModelType`, `ArimaOrder`)
//! - dataset metadata (`DatasetMetadata`, `AnalysisRecord`)
//! - estimation output (`AnalysisResult`, `Coefficient`, `StatValue`)

pub mod types;

pub use types::*;
