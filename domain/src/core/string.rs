//! String utilities for the domain layer.

/// Single-line preview of model output, at most `max_chars` characters.
///
/// Whitespace runs (including newlines) collapse to one space; a cut
/// preview ends with `...`.
pub fn preview(s: &str, max_chars: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let kept: String = collapsed
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect();
    format!("{}...", kept.trim_end())
}

/// Keep the first `max_chars` characters of `s`, appending `...` when cut.
///
/// Unlike [`preview`], whitespace is left as is.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
