//! Text layout helpers for the TUI.
//!
//! Cursor positions in the TUI are character indices, never byte offsets.

/// Converts a character index into a byte offset into `text`.
///
/// Indices past the end clamp to `text.len()`.
pub fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Word-wraps `text` to `width` columns.
///
/// Explicit newlines are kept. Words longer than a line are split. Blank
/// input lines produce empty output lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for raw in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;

        for word in raw.split(' ') {
            let word_len = word.chars().count();

            if line_len > 0 && line_len + 1 + word_len > width {
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }

            let mut rest: Vec<char> = word.chars().collect();
            while line_len + rest.len() > width {
                let take = width - line_len;
                line.extend(rest.drain(..take));
                out.push(std::mem::take(&mut line));
                line_len = 0;
            }
            line_len += rest.len();
            line.extend(rest);
        }

        out.push(line);
    }

    out
}
