//! Plain-text formatting for terminal output.
//!
//! Formatting code lives in one place so the CLI output and its tests stay
//! localized; the TUI reuses the same rendered view with widgets instead.

use crate::catalog::VariableCatalog;
use crate::domain::AnalysisRecord;
use crate::report::{ChartImage, RenderedView};

pub const PLACEHOLDER_TEXT: &str =
    "Configure the variables and run the analysis to see the results.";

/// Dataset header: file, size, and the upstream model suggestion.
pub fn format_dataset_summary(record: &AnalysisRecord, catalog: &VariableCatalog) -> String {
    let meta = &record.metadata;
    let mut out = String::new();

    out.push_str("=== econlab - Econometric Analysis ===\n");
    out.push_str(&format!("File: {}\n", meta.filename));
    if let Some(id) = &meta.id {
        out.push_str(&format!("Analysis id: {id}\n"));
    }
    out.push_str(&format!("Rows: {} | Columns: {}\n", meta.rows, meta.columns.len()));
    out.push_str(&format!(
        "Suggested model: {}\n",
        catalog.suggested_model.as_str().to_uppercase()
    ));
    if !catalog.model_reasoning.is_empty() {
        out.push_str(&format!("  {}\n", catalog.model_reasoning));
    }
    out.push_str(&format!("Variables: {}\n", catalog.selectable_columns.join(", ")));
    out.push_str(&format!("Keys: {}\n", catalog.all_columns.join(", ")));

    out
}

/// First `limit` preview records as a table with one column per dataset column.
pub fn format_preview(record: &AnalysisRecord, limit: usize) -> String {
    let columns = &record.metadata.columns;
    let mut out = String::new();
    if columns.is_empty() || limit == 0 {
        return out;
    }

    let header: Vec<String> = columns.iter().map(|c| format!("{:>12}", truncate(c, 12))).collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');
    let rule: Vec<String> = columns.iter().map(|_| "-".repeat(12)).collect();
    out.push_str(&rule.join(" "));
    out.push('\n');

    for row in record.preview.iter().take(limit) {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| {
                let cell = match row.get(c) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => String::new(),
                    Some(v) => v.to_string(),
                };
                format!("{:>12}", truncate(&cell, 12))
            })
            .collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }

    out
}

/// Coefficients, statistics and chart list. Significant p-values carry a `*`.
pub fn format_view(view: &RenderedView) -> String {
    let RenderedView::Results(results) = view else {
        return format!("{PLACEHOLDER_TEXT}\n");
    };

    let mut out = String::new();

    out.push_str("Coefficients:\n");
    out.push_str(
        format!(
            "{:<24} {:>14} {:>14} {:>12} {:>10}\n",
            "variable", "coefficient", "std_error", "t_stat", "p_value"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<24} {:-<14} {:-<14} {:-<12} {:-<10}\n", "", "", "", "", "").trim_end(),
    );
    out.push('\n');
    for row in &results.coefficients {
        let marker = if row.significant { "*" } else { "" };
        out.push_str(
            format!(
                "{:<24} {:>14} {:>14} {:>12} {:>10}{marker}\n",
                truncate(&row.variable, 24),
                row.coefficient,
                row.std_error,
                row.t_statistic,
                row.p_value,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str("(* p < 0.05)\n");

    if !results.statistics.is_empty() {
        out.push_str("\nModel statistics:\n");
        for tile in &results.statistics {
            out.push_str(&format!("  {:<24} {}\n", tile.label, tile.value));
        }
    }

    if !results.charts.is_empty() {
        out.push_str("\nDiagnostic charts:\n");
        for tab in results.charts.tabs() {
            out.push_str(&format!("  {:<24} {}\n", tab.name, describe_image(&tab.image)));
        }
    }

    out
}

/// One-line description of a chart body, e.g. `PNG 1200x1000 (84.1 KB)`.
pub fn describe_image(image: &ChartImage) -> String {
    match image {
        ChartImage::Invalid(reason) => format!("undecodable image: {reason}"),
        ChartImage::Decoded(bytes) => {
            let size = format!("{:.1} KB", bytes.len() as f64 / 1024.0);
            match image.png_dimensions() {
                Some((w, h)) => format!("PNG {w}x{h} ({size})"),
                None => format!("image ({size})"),
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
