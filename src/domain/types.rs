//! Shared domain types.
//!
//! These mirror the analysis service's JSON payloads. They stay plain and
//! serializable so the same values can be:
//!
//! - received from the service
//! - rendered in the terminal
//! - sent back verbatim for report export

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which econometric model the service should estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Ordinary least squares on cross-section data.
    Linear,
    /// Panel regression keyed by entity and time.
    Panel,
    /// ARIMA time series model.
    ///
    /// The upload endpoint labels detected time series as `timeseries`.
    #[serde(alias = "timeseries")]
    Arima,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [ModelType::Linear, ModelType::Panel, ModelType::Arima];

    pub fn display_name(self) -> &'static str {
        match self {
            ModelType::Linear => "Linear Regression (OLS)",
            ModelType::Panel => "Panel Data",
            ModelType::Arima => "ARIMA",
        }
    }

    /// Wire name, also used for upper-cased summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::Linear => "linear",
            ModelType::Panel => "panel",
            ModelType::Arima => "arima",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn needs_entity_var(self) -> bool {
        matches!(self, ModelType::Panel)
    }

    pub fn needs_time_var(self) -> bool {
        matches!(self, ModelType::Panel | ModelType::Arima)
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dataset metadata produced by the ingestion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub filename: String,
    pub rows: u64,
    /// Column names in dataset order.
    pub columns: Vec<String>,
    pub suggested_model: ModelType,
    pub model_reasoning: String,
}

/// `GET /api/analysis/{id}` response: metadata plus a row preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub metadata: DatasetMetadata,
    /// First records of the dataset (at most 100), one JSON object per row.
    #[serde(default)]
    pub preview: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// ARIMA `(p, d, q)` order; serialized as `[p, d, q]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder(pub u32, pub u32, pub u32);

impl ArimaOrder {
    pub const DEFAULT: ArimaOrder = ArimaOrder(1, 1, 1);
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// One row of the estimated coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub variable: String,
    pub coefficient: f64,
    pub std_error: f64,
    pub t_statistic: f64,
    pub p_value: f64,
}

/// A model statistic value.
///
/// The service mixes floats (`r_squared`), integer counts (`observations`),
/// strings (`effect_type`) and occasionally lists (ARIMA `order`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Estimation output for one submission.
///
/// Map fields keep the payload's key order for display; nothing relies on
/// that order for correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    pub coefficients: Vec<Coefficient>,
    #[serde(default)]
    pub statistics: IndexMap<String, StatValue>,
    /// Chart name -> base64-encoded PNG.
    #[serde(default)]
    pub charts: IndexMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_type_accepts_timeseries_alias() {
        let m: ModelType = serde_json::from_str("\"timeseries\"").unwrap();
        assert_eq!(m, ModelType::Arima);
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"arima\"");
    }

    #[test]
    fn model_type_cycles() {
        assert_eq!(ModelType::Linear.next(), ModelType::Panel);
        assert_eq!(ModelType::Arima.next(), ModelType::Linear);
        assert_eq!(ModelType::Linear.prev(), ModelType::Arima);
    }

    #[test]
    fn stat_values_keep_their_kind() {
        let json = r#"{"r_squared": 0.87, "observations": 120, "effect_type": "fixed", "order": [1, 1, 1]}"#;
        let stats: IndexMap<String, StatValue> = serde_json::from_str(json).unwrap();
        assert_eq!(stats["r_squared"], StatValue::Number(0.87));
        assert_eq!(stats["observations"], StatValue::Integer(120));
        assert_eq!(stats["effect_type"], StatValue::Text("fixed".to_string()));
        assert!(matches!(stats["order"], StatValue::Other(_)));
    }

    #[test]
    fn analysis_record_parses_service_payload() {
        let json = r#"{
            "metadata": {
                "id": "abc",
                "filename": "macro.csv",
                "rows": 120,
                "columns": ["id", "gdp", "inflation", "year"],
                "suggested_model": "linear",
                "model_reasoning": "cross-section"
            },
            "preview": [{"id": 1, "gdp": 2.5}]
        }"#;
        let record: AnalysisRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.metadata.id.as_deref(), Some("abc"));
        assert_eq!(record.metadata.columns.len(), 4);
        assert_eq!(record.preview.len(), 1);
    }

    #[test]
    fn arima_order_serializes_as_list() {
        assert_eq!(serde_json::to_string(&ArimaOrder::DEFAULT).unwrap(), "[1,1,1]");
    }
}
