use std::borrow::Cow;


/// Shortens user-supplied text for log lines, cutting on a char boundary and marking the cut with `...`.
pub fn log_snippet(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}
