//! Focusable configuration fields and option cycling.

use crate::config::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Model,
    Dependent,
    Independents,
    Entity,
    Time,
    Submit,
}

impl Field {
    /// Fields in display order; key fields only appear for models that use them.
    pub fn visible(config: &AnalysisConfig) -> Vec<Field> {
        let mut out = vec![Field::Model, Field::Dependent, Field::Independents];
        if config.shows_entity_var() {
            out.push(Field::Entity);
        }
        if config.shows_time_var() {
            out.push(Field::Time);
        }
        out.push(Field::Submit);
        out
    }
}

/// Step through `options` from `current`, wrapping at both ends.
/// With nothing selected, a forward step picks the first option and a
/// backward step the last.
pub fn cycle_option(options: &[String], current: Option<&str>, delta: i32) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let len = options.len() as i32;
    let next = match current.and_then(|c| options.iter().position(|o| o == c)) {
        Some(idx) => (idx as i32 + delta).rem_euclid(len),
        None if delta >= 0 => 0,
        None => len - 1,
    };
    options.get(next as usize).cloned()
}
