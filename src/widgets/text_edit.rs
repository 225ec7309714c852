//! Char-indexed editing primitives shared by every editable surface.
//!
//! Cursors are char offsets, not byte offsets; helpers translate at the
//! boundary so multi-byte input never lands a cursor inside a code point.

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn byte_index_at_char(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

pub fn clamp_cursor(cursor: usize, text: &str) -> usize {
    cursor.min(char_count(text))
}

pub fn insert_char(text: &mut String, cursor: &mut usize, ch: char) {
    let at = clamp_cursor(*cursor, text);
    let byte = byte_index_at_char(text, at);
    text.insert(byte, ch);
    *cursor = at + 1;
}

/// Remove the char before the cursor. Returns false at the start.
pub fn backspace_char(text: &mut String, cursor: &mut usize) -> bool {
    let at = clamp_cursor(*cursor, text);
    if at == 0 {
        return false;
    }
    let byte = byte_index_at_char(text, at - 1);
    text.remove(byte);
    *cursor = at - 1;
    true
}

/// Remove the char under the cursor. Returns false at the end.
pub fn delete_char(text: &mut String, cursor: &mut usize) -> bool {
    let at = clamp_cursor(*cursor, text);
    if at >= char_count(text) {
        return false;
    }
    let byte = byte_index_at_char(text, at);
    text.remove(byte);
    *cursor = at;
    true
}

pub fn move_left(cursor: &mut usize, text: &str) -> bool {
    let at = clamp_cursor(*cursor, text);
    if at == 0 {
        return false;
    }
    *cursor = at - 1;
    true
}

pub fn move_right(cursor: &mut usize, text: &str) -> bool {
    let at = clamp_cursor(*cursor, text);
    if at >= char_count(text) {
        return false;
    }
    *cursor = at + 1;
    true
}
