// src/view/partial.rs
//! Best-effort parsing of a scenario list that is still being streamed.
use serde::Deserialize;

use crate::models::Scenario;

#[derive(Debug, Default, Deserialize)]
struct PartialScenario {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialScenarioSet {
    #[serde(default)]
    scenarios: Vec<PartialScenario>,
}

/// Parses as many scenario cards as the text so far allows.
///
/// The prefix is completed by closing any open string and containers. If that
/// does not parse, it is cut back to earlier member boundaries until it does.
/// Fields that have not started yet come back empty.
pub fn parse_partial_scenarios(text: &str) -> Option<Vec<Scenario>> {
    if text.trim().is_empty() {
        return None;
    }

    let mut candidates = vec![text.len()];
    candidates.extend(cut_points(text).into_iter().rev());

    candidates.into_iter().find_map(|end| {
        let completed = complete_json(&text[..end]);
        serde_json::from_str::<PartialScenarioSet>(&completed)
            .ok()
            .map(|set| {
                set.scenarios
                    .into_iter()
                    .map(|s| Scenario {
                        event: s.event.unwrap_or_default(),
                        description: s.description.unwrap_or_default(),
                    })
                    .collect()
            })
    })
}

/// Byte offsets where the prefix ends right before a `,` or right after an
/// opening bracket, outside of strings. Ascending.
fn cut_points(text: &str) -> Vec<usize> {
    let mut points = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => points.push(i),
            '{' | '[' => points.push(i + 1),
            _ => {}
        }
    }
    points
}

/// Appends whatever closes the open string and containers of `prefix`.
fn complete_json(prefix: &str) -> String {
    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in prefix.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                closers.pop();
            }
            _ => {}
        }
    }

    let mut completed = String::with_capacity(prefix.len() + closers.len() + 1);
    completed.push_str(prefix);
    if in_string {
        completed.push('"');
    }
    completed.extend(closers.into_iter().rev());
    completed
}
