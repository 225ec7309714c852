use serde::{Deserialize, Serialize};

use crate::core::value::{Value, format_number};
use crate::terminal::{KeyCode, KeyEvent, KeyModifiers};
use crate::widgets::text_edit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    #[default]
    Text,
    Number,
    Currency,
    Multiline,
}

impl CellKind {
    /// Increment applied by Alt+Up / Alt+Down on numeric cells.
    pub fn step(self) -> f64 {
        match self {
            Self::Number => 1.0,
            Self::Currency => 0.01,
            Self::Text | Self::Multiline => 0.0,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Currency)
    }

    fn accepts_char(self, ch: char) -> bool {
        if self.is_numeric() {
            ch.is_ascii_digit() || ch == '.' || ch == '-'
        } else {
            !ch.is_control()
        }
    }
}

/// What a keystroke did to the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEdit {
    /// Buffer content changed; the host should emit `ValueChanged`.
    Changed,
    /// Cursor moved, content untouched.
    Moved,
    Ignored,
}

/// Per-cell edit state: the committed value the data layer owns, the local
/// buffer the user types into, and the dirty flag that ties them together.
/// Knows nothing about grid layout.
#[derive(Debug, Clone)]
pub struct CellState {
    committed: Value,
    local: String,
    dirty: bool,
    kind: CellKind,
    cursor: usize,
}

impl CellState {
    pub fn new(kind: CellKind, committed: Value) -> Self {
        let local = committed.to_edit_text();
        let cursor = text_edit::char_count(&local);
        Self {
            committed,
            local,
            dirty: false,
            kind,
            cursor,
        }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn committed(&self) -> &Value {
        &self.committed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cursor(&self) -> usize {
        text_edit::clamp_cursor(self.cursor, &self.local)
    }

    /// Cursor position as (line, column) within the buffer.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let at = self.cursor();
        let mut line = 0usize;
        let mut col = 0usize;
        for ch in self.local.chars().take(at) {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    /// Buffer split into visual lines; always at least one entry.
    pub fn lines(&self) -> Vec<&str> {
        self.local.split('\n').collect()
    }

    fn refresh_dirty(&mut self) {
        self.dirty = self.local != self.committed.to_edit_text();
    }

    /// Mutate the buffer through a closure. Both the anchor input and the
    /// overlay editor go through here, so the two surfaces read and write
    /// one state and can never diverge mid-edit.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut String, &mut usize) -> R) -> R {
        let out = f(&mut self.local, &mut self.cursor);
        self.refresh_dirty();
        out
    }

    pub fn set_local(&mut self, text: impl Into<String>) {
        self.local = text.into();
        self.cursor = text_edit::char_count(&self.local);
        self.refresh_dirty();
    }

    /// Resynchronize against an externally changed committed value. External
    /// changes always win over a cell the user is not actively focused on;
    /// a focused cell keeps its buffer and only re-derives the dirty flag.
    pub fn sync_committed(&mut self, value: &Value, focused: bool) {
        if *value == self.committed {
            return;
        }
        self.committed = value.clone();
        if focused {
            self.refresh_dirty();
        } else {
            self.local = self.committed.to_edit_text();
            self.cursor = text_edit::char_count(&self.local);
            self.dirty = false;
        }
    }

    /// Commit path: returns the new value exactly once per edit sequence,
    /// or `None` when the buffer matches the committed value (a clean blur
    /// must not produce a redundant write).
    pub fn take_commit(&mut self) -> Option<Value> {
        if !self.dirty {
            return None;
        }
        let value = self.commit_value();
        self.committed = value.clone();
        self.dirty = false;
        Some(value)
    }

    fn commit_value(&self) -> Value {
        if self.local.is_empty() {
            return Value::None;
        }
        if self.kind.is_numeric() {
            if let Ok(number) = self.local.trim().parse::<f64>() {
                return Value::Number(number);
            }
        }
        Value::Text(self.local.clone())
    }

    /// Revert path: discard the buffer and restore the committed value.
    pub fn revert(&mut self) {
        self.local = self.committed.to_edit_text();
        self.cursor = text_edit::char_count(&self.local);
        self.dirty = false;
    }

    /// Adjust a numeric cell by its step. No-op for text kinds.
    pub fn step_by(&mut self, direction: i32) -> CellEdit {
        if !self.kind.is_numeric() {
            return CellEdit::Ignored;
        }
        let current = self
            .local
            .trim()
            .parse::<f64>()
            .ok()
            .or_else(|| self.committed.as_number())
            .unwrap_or(0.0);
        let next = current + self.kind.step() * direction as f64;
        // Round away accumulated float dust at cent precision.
        let next = (next * 100.0).round() / 100.0;
        self.set_local(format_number(next));
        CellEdit::Changed
    }

    pub fn on_key(&mut self, key: KeyEvent) -> CellEdit {
        match key.code {
            // Ctrl/Alt chords are bindings, not input.
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                CellEdit::Ignored
            }
            KeyCode::Char(ch) if self.kind.accepts_char(ch) => {
                self.edit(|text, cursor| text_edit::insert_char(text, cursor, ch));
                CellEdit::Changed
            }
            KeyCode::Enter if self.kind == CellKind::Multiline => {
                self.edit(|text, cursor| text_edit::insert_char(text, cursor, '\n'));
                CellEdit::Changed
            }
            KeyCode::Backspace => {
                if self.edit(|text, cursor| text_edit::backspace_char(text, cursor)) {
                    CellEdit::Changed
                } else {
                    CellEdit::Ignored
                }
            }
            KeyCode::Delete => {
                if self.edit(|text, cursor| text_edit::delete_char(text, cursor)) {
                    CellEdit::Changed
                } else {
                    CellEdit::Ignored
                }
            }
            KeyCode::Left => {
                if text_edit::move_left(&mut self.cursor, &self.local) {
                    CellEdit::Moved
                } else {
                    CellEdit::Ignored
                }
            }
            KeyCode::Right => {
                if text_edit::move_right(&mut self.cursor, &self.local) {
                    CellEdit::Moved
                } else {
                    CellEdit::Ignored
                }
            }
            KeyCode::Home => {
                self.cursor = 0;
                CellEdit::Moved
            }
            KeyCode::End => {
                self.cursor = text_edit::char_count(&self.local);
                CellEdit::Moved
            }
            _ => CellEdit::Ignored,
        }
    }
}
