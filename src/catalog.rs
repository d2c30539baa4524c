//! Variable catalog: which dataset columns can be picked as model variables.

use crate::domain::{DatasetMetadata, ModelType};

/// Columns offered to the configuration, derived from dataset metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableCatalog {
    /// Every column in dataset order (entity/time key candidates).
    pub all_columns: Vec<String>,
    /// Columns usable as dependent/independent variables.
    pub selectable_columns: Vec<String>,
    pub suggested_model: ModelType,
    pub model_reasoning: String,
}

impl VariableCatalog {
    pub fn resolve(metadata: &DatasetMetadata) -> Self {
        let all_columns = metadata.columns.clone();
        let selectable_columns = all_columns
            .iter()
            .filter(|col| !is_identifier_like(col))
            .cloned()
            .collect();

        Self {
            all_columns,
            selectable_columns,
            suggested_model: metadata.suggested_model,
            model_reasoning: metadata.model_reasoning.clone(),
        }
    }

    pub fn is_selectable(&self, column: &str) -> bool {
        self.selectable_columns.iter().any(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.all_columns.iter().any(|c| c == column)
    }
}

/// Coarse identifier filter: any column whose lowercase name contains `id`.
///
/// This also drops names like `valid_flag` or `Identifier`.
pub fn is_identifier_like(column: &str) -> bool {
    column.to_lowercase().contains("id")
}
