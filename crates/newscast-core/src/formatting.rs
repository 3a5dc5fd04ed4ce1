//! Helpers for Telegram-flavoured HTML text.

/// Escape the characters Telegram's HTML parse mode treats specially.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// First `max_chars` characters of `text` followed by `...`.
///
/// The ellipsis is always appended, matching how status logs label a post or poll
/// by a fixed-width prefix.
pub fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}

/// Escaped [`preview`], safe to embed in an HTML message.
pub fn preview_html(text: &str, max_chars: usize) -> String {
    escape_html(&preview(text, max_chars))
}
