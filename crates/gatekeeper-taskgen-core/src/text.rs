// SPDX-License-Identifier: Apache-2.0

//! Small text helpers shared by prompt rendering, bundle emission and repair.

pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Cuts `text` to at most `limit` bytes (on a char boundary) and appends
/// [`TRUNCATION_MARKER`] when anything was removed.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &text[..end])
}

#[must_use]
pub fn indent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes one surrounding Markdown code fence (```` ``` ```` or ```` ```yaml ````).
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.first().is_some_and(|l| l.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Renders `value` as a single-quoted YAML scalar.
#[must_use]
pub fn yaml_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
