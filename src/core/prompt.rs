//! Builds a text prompt asking an AI assistant to propose cleaning rules.
//!
//! The prompt lists the collected examples, ignore words and a slice of the
//! sample titles, then asks for rules in the `name` / `pattern` / `why` shape
//! the workshop stores.

use chrono::{DateTime, Local};

use super::workspace::{Workspace, UNSELECTED_GENRE};

pub const MAX_PROMPT_EXCLUDE: usize = 80;
pub const MAX_PROMPT_KEEP: usize = 50;
pub const MAX_PROMPT_IGNORE: usize = 80;
pub const MAX_PROMPT_SAMPLES: usize = 120;

fn push_section(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(heading.to_string());
    lines.extend(items.iter().map(|item| format!("- {}", item)));
    lines.push(String::new());
}

/// Renders the prompt for `genre`, stamped with `generated_at`.
///
/// Ignore words are the ones effective for `genre` (global first). Each list
/// is truncated to its `MAX_PROMPT_*` limit.
pub fn build_ai_prompt(ws: &Workspace, genre: &str, generated_at: DateTime<Local>) -> String {
    let exclude = &ws.exclude_examples[..ws.exclude_examples.len().min(MAX_PROMPT_EXCLUDE)];
    let keep = &ws.keep_examples[..ws.keep_examples.len().min(MAX_PROMPT_KEEP)];
    let samples = &ws.sample_titles[..ws.sample_titles.len().min(MAX_PROMPT_SAMPLES)];
    let mut ignore = ws.ignore.effective_for_genre(genre);
    ignore.truncate(MAX_PROMPT_IGNORE);

    let mut lines = vec![
        "You are a regular expression expert. Propose several regex rules that strip noise from the titles below.".to_string(),
        String::new(),
        "[Goal]".to_string(),
        "- File names are not renamed; the cleaned string is only used for search and classification.".to_string(),
        "- Keep each rule small so it can be switched on and off on its own.".to_string(),
        "- Explain briefly what each rule removes.".to_string(),
        String::new(),
    ];

    let genre = genre.trim();
    if !genre.is_empty() && genre != UNSELECTED_GENRE {
        lines.push(format!("[Genre] {}", genre));
    }
    lines.push(format!("[Created] {}", generated_at.format("%Y-%m-%d %H:%M:%S")));
    lines.push(String::new());

    push_section(&mut lines, "[Ignore words (candidates)]", &ignore);
    push_section(&mut lines, "[EX: titles with noise to remove]", exclude);
    push_section(&mut lines, "[KEEP: titles that must not change]", keep);

    lines.push("[More samples (trends)]".to_string());
    lines.extend(samples.iter().map(|t| format!("- {}", t)));
    lines.push(String::new());

    lines.extend(
        [
            "[Output format] (per rule)",
            "- name: rule name",
            "- pattern: regular expression (one line)",
            "- why: what it removes (short)",
            "- caution: titles it might hit by mistake",
        ]
        .map(String::from),
    );
    lines.join("\n")
}
