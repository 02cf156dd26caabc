// src/view/render.rs
use std::fmt::Write;

use super::ScenarioBoard;
use crate::models::{Horizon, Indicator};

const PREVIEW_CHARS: usize = 96;

/// One line per card, the selected card marked.
pub fn render_cards(board: &ScenarioBoard) -> String {
    if board.scenarios().is_empty() {
        return if board.is_generating() {
            "Generating scenarios...\n".to_string()
        } else {
            "No scenarios yet. Try `generate [instructions]`.\n".to_string()
        };
    }

    let mut out = String::new();
    for (idx, scenario) in board.scenarios().iter().enumerate() {
        let marker = if board.selected() == Some(idx) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} [{}] {}: {}",
            marker,
            idx,
            scenario.event,
            preview(&scenario.description)
        );
    }
    out
}

/// Parameter table of the selected card, or a hint when nothing is selected.
pub fn render_selected(board: &ScenarioBoard) -> String {
    let idx = match board.selected() {
        Some(idx) => idx,
        None => return "Select a scenario to view its economic parameters\n".to_string(),
    };
    let params = match board.parameters(idx) {
        Some(params) => params,
        None => return "Loading...\n".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Economic Parameters");
    let _ = writeln!(out, "pdf value: {:e}  (ratio to mean {:.4})", params.pdf_value, params.pdf_ratio);
    if let Some(likelihood) = board.likelihood(idx) {
        let _ = writeln!(out, "likelihood: {} ({})", likelihood, likelihood.color());
    }

    let _ = write!(out, "{:<20}", "");
    for horizon in Horizon::ALL {
        let _ = write!(out, "{:>9}", format!("{}m", horizon.months()));
    }
    let _ = writeln!(out);

    for indicator in Indicator::ALL {
        let scale = board.scales().get(indicator);
        let _ = write!(out, "{:<20}", format!("{} ({})", indicator.label(), indicator.unit()));
        for horizon in Horizon::ALL {
            let _ = write!(out, "{:>9.1}", params.value(indicator, horizon));
        }
        let _ = writeln!(out, "   [{} .. {}]", scale.min(), scale.max());
    }

    if !params.related_events.is_empty() {
        let _ = writeln!(out, "related events:");
        for event in &params.related_events {
            let _ = writeln!(out, "  - {}", event);
        }
    }
    out
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}
