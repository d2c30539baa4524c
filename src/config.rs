//! In-progress model specification and its edit rules.
//!
//! `AnalysisConfig` is the single mutable state the dashboard edits. Every
//! mutator enforces its own rule, so the stored configuration never holds a
//! dependent variable that is also independent, nor a variable the catalog
//! does not offer.

use tracing::debug;

use crate::catalog::VariableCatalog;
use crate::domain::{ArimaOrder, ModelType};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    catalog: VariableCatalog,
    model_type: Option<ModelType>,
    dependent_var: Option<String>,
    independent_vars: Vec<String>,
    entity_var: Option<String>,
    time_var: Option<String>,
    arima_order: ArimaOrder,
}

impl AnalysisConfig {
    /// Empty configuration with no model type.
    pub fn new(catalog: VariableCatalog) -> Self {
        Self {
            catalog,
            model_type: None,
            dependent_var: None,
            independent_vars: Vec::new(),
            entity_var: None,
            time_var: None,
            arima_order: ArimaOrder::DEFAULT,
        }
    }

    /// Configuration seeded with the catalog's suggested model.
    pub fn seeded(catalog: VariableCatalog) -> Self {
        let suggested = catalog.suggested_model;
        let mut config = Self::new(catalog);
        config.model_type = Some(suggested);
        config
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn model_type(&self) -> Option<ModelType> {
        self.model_type
    }

    pub fn dependent_var(&self) -> Option<&str> {
        self.dependent_var.as_deref()
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

    pub fn is_independent(&self, column: &str) -> bool {
        self.independent_vars.iter().any(|v| v == column)
    }

    /// Switching model type keeps every other selection.
    pub fn set_model_type(&mut self, model_type: ModelType) {
        debug!(model = %model_type, "model type set");
        self.model_type = Some(model_type);
    }

    /// Set the dependent variable, first dropping it from the independents.
    pub fn set_dependent_var(&mut self, column: &str) -> Result<(), ConfigError> {
        if !self.catalog.is_selectable(column) {
            return Err(ConfigError::NotSelectable(column.to_string()));
        }
        self.independent_vars.retain(|v| v != column);
        self.dependent_var = Some(column.to_string());
        debug!(dependent = column, "dependent variable set");
        Ok(())
    }

    /// Add or remove an independent variable. Returns whether it is now selected.
    pub fn toggle_independent_var(&mut self, column: &str) -> Result<bool, ConfigError> {
        if !self.catalog.is_selectable(column) {
            return Err(ConfigError::NotSelectable(column.to_string()));
        }
        if self.dependent_var.as_deref() == Some(column) {
            return Err(ConfigError::DependentAsIndependent(column.to_string()));
        }

        let selected = if let Some(pos) = self.independent_vars.iter().position(|v| v == column) {
            self.independent_vars.remove(pos);
            false
        } else {
            self.independent_vars.push(column.to_string());
            true
        };
        debug!(column, selected, "independent variable toggled");
        Ok(selected)
    }

    /// Entity key; any dataset column, identifiers included.
    pub fn set_entity_var(&mut self, column: &str) -> Result<(), ConfigError> {
        self.entity_var = Some(self.key_column(column)?);
        Ok(())
    }

    /// Time key; any dataset column, identifiers included.
    pub fn set_time_var(&mut self, column: &str) -> Result<(), ConfigError> {
        self.time_var = Some(self.key_column(column)?);
        Ok(())
    }

    fn key_column(&self, column: &str) -> Result<String, ConfigError> {
        if !self.catalog.contains(column) {
            return Err(ConfigError::UnknownColumn(column.to_string()));
        }
        Ok(column.to_string())
    }

    pub fn dependent_options(&self) -> &[String] {
        &self.catalog.selectable_columns
    }

    /// Selectable columns minus the current dependent variable.
    pub fn independent_options(&self) -> Vec<&str> {
        self.catalog
            .selectable_columns
            .iter()
            .map(String::as_str)
            .filter(|c| Some(*c) != self.dependent_var.as_deref())
            .collect()
    }

    /// Entity/time key candidates.
    pub fn key_options(&self) -> &[String] {
        &self.catalog.all_columns
    }

    pub fn shows_entity_var(&self) -> bool {
        self.model_type.is_some_and(ModelType::needs_entity_var)
    }

    pub fn shows_time_var(&self) -> bool {
        self.model_type.is_some_and(ModelType::needs_time_var)
    }

    /// Check submission readiness, naming the first missing category.
    pub fn readiness(&self) -> Result<ModelType, ConfigError> {
        let model_type = self.model_type.ok_or(ConfigError::MissingModelType)?;
        if self.dependent_var.is_none() || self.independent_vars.is_empty() {
            return Err(ConfigError::MissingVariables);
        }
        if model_type == ModelType::Panel && (self.entity_var.is_none() || self.time_var.is_none()) {
            return Err(ConfigError::MissingPanelKeys);
        }
        if model_type == ModelType::Arima && self.time_var.is_none() {
            return Err(ConfigError::MissingTimeVar);
        }
        Ok(model_type)
    }

    pub fn can_submit(&self) -> bool {
        self.readiness().is_ok()
    }
}
