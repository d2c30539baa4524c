//! Results rendering: project an `AnalysisResult` into a display structure.
//!
//! Rendering is a pure function of the payload. The terminal front-ends
//! (`format` for plain text, `tui` for widgets) only lay out what this
//! module produces.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::{AnalysisResult, Coefficient, StatValue};

pub mod format;

pub use format::*;

/// p-values strictly below this are flagged as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedView {
    /// No analysis has completed yet.
    Placeholder,
    Results(ResultsView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub coefficients: Vec<CoefficientRow>,
    pub statistics: Vec<StatTile>,
    pub charts: ChartTabs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientRow {
    pub variable: String,
    pub coefficient: String,
    pub std_error: String,
    pub t_statistic: String,
    pub p_value: String,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatTile {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartTab {
    pub name: String,
    pub image: ChartImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartImage {
    Decoded(Vec<u8>),
    /// The payload was not valid base64.
    Invalid(String),
}

impl ChartImage {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            ChartImage::Decoded(bytes) => Some(bytes),
            ChartImage::Invalid(_) => None,
        }
    }

    /// Width and height from the PNG header, when the image is a PNG.
    pub fn png_dimensions(&self) -> Option<(u32, u32)> {
        const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let bytes = self.bytes()?;
        if bytes.len() < 24 || bytes[..8] != SIGNATURE || bytes[12..16] != *b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        Some((width, height))
    }
}

/// Chart tabs with exactly one active tab (when any exist).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChartTabs {
    tabs: Vec<ChartTab>,
    active: usize,
}

impl ChartTabs {
    pub fn tabs(&self) -> &[ChartTab] {
        &self.tabs
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn active(&self) -> Option<&ChartTab> {
        self.tabs.get(self.active)
    }

    pub fn active_index(&self) -> Option<usize> {
        (!self.tabs.is_empty()).then_some(self.active)
    }

    /// Activate the tab with this name. Returns false if there is none.
    pub fn select(&mut self, name: &str) -> bool {
        match self.tabs.iter().position(|t| t.name == name) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => false,
        }
    }

    pub fn next(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + 1) % self.tabs.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
        }
    }
}

pub fn render(result: Option<&AnalysisResult>) -> RenderedView {
    let Some(result) = result else {
        return RenderedView::Placeholder;
    };

    let coefficients = result.coefficients.iter().map(coefficient_row).collect();

    let statistics = result
        .statistics
        .iter()
        .map(|(key, value)| StatTile {
            key: key.clone(),
            label: humanize_key(key),
            value: format_stat_value(value),
        })
        .collect();

    let tabs = result
        .charts
        .iter()
        .map(|(name, payload)| ChartTab {
            name: name.clone(),
            image: decode_chart(payload),
        })
        .collect();

    RenderedView::Results(ResultsView {
        coefficients,
        statistics,
        charts: ChartTabs { tabs, active: 0 },
    })
}

fn coefficient_row(c: &Coefficient) -> CoefficientRow {
    CoefficientRow {
        variable: c.variable.clone(),
        coefficient: fixed4(c.coefficient),
        std_error: fixed4(c.std_error),
        t_statistic: fixed4(c.t_statistic),
        p_value: fixed4(c.p_value),
        significant: c.p_value < SIGNIFICANCE_LEVEL,
    }
}

/// `adj_r_squared` -> `ADJ R SQUARED`.
pub fn humanize_key(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

/// Floats get four decimals; integer counts and text are shown as received.
pub fn format_stat_value(value: &StatValue) -> String {
    match value {
        StatValue::Integer(v) => v.to_string(),
        StatValue::Number(v) => fixed4(*v),
        StatValue::Text(s) => s.clone(),
        StatValue::Other(v) => v.to_string(),
    }
}

pub fn decode_chart(payload: &str) -> ChartImage {
    match STANDARD.decode(payload.trim()) {
        Ok(bytes) => ChartImage::Decoded(bytes),
        Err(e) => ChartImage::Invalid(e.to_string()),
    }
}

fn fixed4(v: f64) -> String {
    format!("{v:.4}")
}
