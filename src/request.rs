//! Estimation request assembly.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::domain::{ArimaOrder, ModelType};
use crate::error::ConfigError;

/// Body of `POST /api/analyze`. Built once per submission and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    analysis_id: String,
    model_type: ModelType,
    dependent_var: String,
    independent_vars: Vec<String>,
    entity_var: Option<String>,
    time_var: Option<String>,
    arima_order: ArimaOrder,
}

impl AnalysisRequest {
    /// Build a request from a configuration that passes `readiness()`.
    ///
    /// Key fields that do not apply to the chosen model are sent as `null`,
    /// even when the configuration still remembers an earlier value.
    pub fn build(analysis_id: &str, config: &AnalysisConfig) -> Result<Self, ConfigError> {
        let model_type = config.readiness()?;
        let dependent_var = config
            .dependent_var()
            .ok_or(ConfigError::MissingVariables)?
            .to_string();

        let entity_var = if model_type.needs_entity_var() {
            config.entity_var().map(str::to_string)
        } else {
            None
        };
        let time_var = if model_type.needs_time_var() {
            config.time_var().map(str::to_string)
        } else {
            None
        };

        Ok(Self {
            analysis_id: analysis_id.to_string(),
            model_type,
            dependent_var,
            independent_vars: config.independent_vars().to_vec(),
            entity_var,
            time_var,
            arima_order: ArimaOrder::DEFAULT,
        })
    }

    pub fn analysis_id(&self) -> &str {
        &self.analysis_id
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn dependent_var(&self) -> &str {
        &self.dependent_var
    }

    pub fn independent_vars(&self) -> &[String] {
        &self.independent_vars
    }

    pub fn entity_var(&self) -> Option<&str> {
        self.entity_var.as_deref()
    }

    pub fn time_var(&self) -> Option<&str> {
        self.time_var.as_deref()
    }

    pub fn arima_order(&self) -> ArimaOrder {
        self.arima_order
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::VariableCatalog;
    use crate::domain::DatasetMetadata;

    fn config(model: ModelType) -> AnalysisConfig {
        let metadata = DatasetMetadata {
            id: None,
            filename: "macro.csv".to_string(),
            rows: 4,
            columns: ["id", "gdp", "inflation", "year"].iter().map(|c| c.to_string()).collect(),
            suggested_model: model,
            model_reasoning: String::new(),
        };
        AnalysisConfig::seeded(VariableCatalog::resolve(&metadata))
    }

    #[test]
    fn linear_request_wire_shape() {
        let mut cfg = config(ModelType::Linear);
        cfg.set_dependent_var("gdp").unwrap();
        cfg.toggle_independent_var("inflation").unwrap();
        assert!(cfg.can_submit());

        let req = AnalysisRequest::build("a1", &cfg).unwrap();
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
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
    }

    #[test]
    fn inapplicable_keys_are_absent() {
        let mut cfg = config(ModelType::Panel);
        cfg.set_dependent_var("gdp").unwrap();
        cfg.toggle_independent_var("inflation").unwrap();
        cfg.set_entity_var("id").unwrap();
        cfg.set_time_var("year").unwrap();

        let panel = AnalysisRequest::build("a1", &cfg).unwrap();
        assert_eq!(panel.entity_var(), Some("id"));
        assert_eq!(panel.time_var(), Some("year"));

        cfg.set_model_type(ModelType::Arima);
        let arima = AnalysisRequest::build("a1", &cfg).unwrap();
        assert_eq!(arima.entity_var(), None);
        assert_eq!(arima.time_var(), Some("year"));

        cfg.set_model_type(ModelType::Linear);
        let linear = AnalysisRequest::build("a1", &cfg).unwrap();
        assert_eq!(linear.entity_var(), None);
        assert_eq!(linear.time_var(), None);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut cfg = config(ModelType::Panel);
        cfg.set_dependent_var("gdp").unwrap();
        cfg.toggle_independent_var("inflation").unwrap();
        assert!(!cfg.can_submit());
        assert_eq!(
            AnalysisRequest::build("a1", &cfg),
            Err(ConfigError::MissingPanelKeys)
        );
    }

    #[test]
    fn build_is_deterministic() {
        let mut cfg = config(ModelType::Linear);
        cfg.set_dependent_var("gdp").unwrap();
        cfg.toggle_independent_var("year").unwrap();
        cfg.toggle_independent_var("inflation").unwrap();

        let first = AnalysisRequest::build("a1", &cfg).unwrap();
        let second = AnalysisRequest::build("a1", &cfg).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.independent_vars(), ["year", "inflation"]);

        cfg.toggle_independent_var("year").unwrap();
        let third = AnalysisRequest::build("a1", &cfg).unwrap();
        assert_ne!(first, third);
        assert_eq!(first.independent_vars().len(), 2);
    }
}
