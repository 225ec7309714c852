//! Expanded overlay editor for a single-line text field.
//!
//! The overlay is the second view onto the anchor cell's `CellState`; every
//! keystroke lands in that one buffer, so anchor and overlay cannot diverge
//! mid-edit. The grid owns at most one of these at a time and force-commits
//! it before opening another.

use unicode_width::UnicodeWidthStr;

use crate::terminal::{KeyCode, KeyEvent, KeyModifiers};
use crate::ui::frame::clip_text_to_width;
use crate::ui::span::{Span, SpanLine};
use crate::ui::style::{Color, Style};
use crate::widgets::grid::cell::{CellEdit, CellState};
use crate::widgets::grid::navigation::FieldId;
use crate::widgets::text_edit;

/// Content longer than this auto-opens the overlay on focus.
pub const AUTO_EXPAND_THRESHOLD: usize = 10;

pub fn should_auto_expand(content: &str) -> bool {
    text_edit::char_count(content) > AUTO_EXPAND_THRESHOLD
}

/// Document-relative overlay geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRect {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    /// Height of the editor box, helper line excluded.
    pub height: i32,
}

impl OverlayRect {
    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= self.top
            && row < self.top + self.height
            && col >= self.left
            && col < self.left + self.width
    }
}

/// What the overlay decided about a keystroke. The grid turns these into
/// actions: commits emit `CommitField`, reverts restore the saved value,
/// the navigation variants additionally move focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    Edited,
    Moved,
    Commit,
    CommitAndNext,
    CommitAndPrev,
    Revert,
    Ignored,
}

pub struct ExpandableOverlay {
    field: FieldId,
    /// Buffer snapshot taken at expand time; Escape restores this.
    saved: String,
    rect: OverlayRect,
    helper_height: i32,
    /// Manual expansion selects everything so the first keystroke replaces
    /// the whole value.
    select_all: bool,
    scroll: usize,
}

impl ExpandableOverlay {
    pub fn new(
        field: FieldId,
        saved: impl Into<String>,
        rect: OverlayRect,
        helper_height: i32,
        select_all: bool,
    ) -> Self {
        Self {
            field,
            saved: saved.into(),
            rect,
            helper_height,
            select_all,
            scroll: 0,
        }
    }

    pub fn field(&self) -> &FieldId {
        &self.field
    }

    pub fn saved(&self) -> &str {
        &self.saved
    }

    pub fn rect(&self) -> OverlayRect {
        self.rect
    }

    /// Called when the viewport resizes and geometry was recomputed.
    pub fn set_rect(&mut self, rect: OverlayRect) {
        self.rect = rect;
    }

    /// Hit test covering the editor box and its helper line.
    pub fn hit_test(&self, row: i32, col: i32) -> bool {
        let full = OverlayRect {
            height: self.rect.height + self.helper_height,
            ..self.rect
        };
        full.contains(row, col)
    }

    fn content_height(&self) -> usize {
        (self.rect.height - 2).max(1) as usize
    }

    fn content_width(&self) -> usize {
        (self.rect.width - 2).max(1) as usize
    }

    fn ensure_cursor_visible(&mut self, cell: &CellState) {
        let (line, _) = cell.cursor_line_col();
        let height = self.content_height();
        if line < self.scroll {
            self.scroll = line;
        } else if line >= self.scroll + height {
            self.scroll = line + 1 - height;
        }
    }

    pub fn on_key(&mut self, cell: &mut CellState, key: KeyEvent) -> OverlayEvent {
        let event = match key.code {
            KeyCode::Esc => return OverlayEvent::Revert,
            KeyCode::Tab => return OverlayEvent::CommitAndNext,
            KeyCode::BackTab => return OverlayEvent::CommitAndPrev,
            KeyCode::Enter => {
                if !key.modifiers.contains(KeyModifiers::SHIFT) {
                    return OverlayEvent::Commit;
                }
                self.replace_selection_if_pending(cell);
                cell.edit(|text, cursor| text_edit::insert_char(text, cursor, '\n'));
                OverlayEvent::Edited
            }
            // Ctrl/Alt chords are bindings, never text; leave any pending
            // selection intact.
            KeyCode::Char(_)
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                return OverlayEvent::Ignored;
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.replace_selection_if_pending(cell);
                cell.edit(|text, cursor| text_edit::insert_char(text, cursor, ch));
                OverlayEvent::Edited
            }
            KeyCode::Backspace | KeyCode::Delete if self.select_all => {
                self.select_all = false;
                cell.set_local("");
                OverlayEvent::Edited
            }
            _ => {
                self.select_all = false;
                match cell.on_key(key) {
                    CellEdit::Changed => OverlayEvent::Edited,
                    CellEdit::Moved => OverlayEvent::Moved,
                    CellEdit::Ignored => OverlayEvent::Ignored,
                }
            }
        };
        self.ensure_cursor_visible(cell);
        event
    }

    fn replace_selection_if_pending(&mut self, cell: &mut CellState) {
        if self.select_all {
            self.select_all = false;
            cell.set_local("");
        }
    }

    /// Cursor position in document coordinates, for the hardware caret.
    pub fn cursor_doc_pos(&self, cell: &CellState) -> (i32, i32) {
        let (line, col) = cell.cursor_line_col();
        let visible_line = line.saturating_sub(self.scroll) as i32;
        let row = self.rect.top + 1 + visible_line.min(self.rect.height - 2);
        let text: String = cell
            .lines()
            .get(line)
            .map(|l| l.chars().take(col).collect())
            .unwrap_or_default();
        let col = self.rect.left + 1 + UnicodeWidthStr::width(text.as_str()) as i32;
        (row, col)
    }

    /// The floating editor box plus helper line, ready to composite.
    pub fn draw(&self, cell: &CellState) -> Vec<SpanLine> {
        let border = Style::new().color(Color::Cyan);
        let inner_width = self.content_width();
        let mut out = Vec::<SpanLine>::new();

        out.push(vec![Span::styled(
            format!("┌{}┐", "─".repeat(inner_width)),
            border,
        )]);

        let lines = cell.lines();
        let content_style = if self.select_all {
            Style::new().background(Color::Blue).color(Color::White)
        } else {
            Style::default()
        };
        for idx in 0..self.content_height() {
            let raw = lines.get(self.scroll + idx).copied().unwrap_or("");
            let clipped = clip_text_to_width(raw, inner_width);
            let pad = inner_width - UnicodeWidthStr::width(clipped.as_str());
            out.push(vec![
                Span::styled("│", border),
                Span::styled(clipped, content_style),
                Span::new(" ".repeat(pad)),
                Span::styled("│", border),
            ]);
        }

        out.push(vec![Span::styled(
            format!("└{}┘", "─".repeat(inner_width)),
            border,
        )]);

        if self.helper_height > 0 {
            out.push(vec![Span::styled(
                clip_text_to_width(
                    " Enter commit · Shift+Enter newline · Esc cancel",
                    inner_width + 2,
                ),
                Style::new().color(Color::DarkGrey),
            )]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use crate::widgets::grid::cell::CellKind;

    fn overlay(select_all: bool) -> ExpandableOverlay {
        ExpandableOverlay::new(
            FieldId::new(1, "description"),
            "saved text",
            OverlayRect {
                top: 5,
                left: 2,
                width: 30,
                height: 5,
            },
            1,
            select_all,
        )
    }

    #[test]
    fn threshold_is_strictly_greater_than_ten() {
        assert!(!should_auto_expand(&"x".repeat(10)));
        assert!(should_auto_expand(&"x".repeat(11)));
    }

    #[test]
    fn first_keystroke_replaces_selected_content() {
        let mut cell = CellState::new(CellKind::Text, Value::from("saved text"));
        let mut overlay = overlay(true);

        assert_eq!(overlay.on_key(&mut cell, KeyEvent::char('N')), OverlayEvent::Edited);
        assert_eq!(cell.local(), "N");
    }

    #[test]
    fn modifier_chords_leave_buffer_and_selection_alone() {
        let mut cell = CellState::new(CellKind::Text, Value::from("saved text"));
        let mut overlay = overlay(true);

        assert_eq!(
            overlay.on_key(&mut cell, KeyEvent::ctrl(KeyCode::Char('e'))),
            OverlayEvent::Ignored
        );
        assert_eq!(cell.local(), "saved text");
        // The selection survives the chord: the next printable still
        // replaces the whole value.
        overlay.on_key(&mut cell, KeyEvent::char('N'));
        assert_eq!(cell.local(), "N");
    }

    #[test]
    fn movement_cancels_the_selection() {
        let mut cell = CellState::new(CellKind::Text, Value::from("saved text"));
        let mut overlay = overlay(true);

        overlay.on_key(&mut cell, KeyEvent::plain(KeyCode::Left));
        overlay.on_key(&mut cell, KeyEvent::char('x'));
        assert_ne!(cell.local(), "x");
    }

    #[test]
    fn shift_enter_stays_open_and_inserts_newline() {
        let mut cell = CellState::new(CellKind::Text, Value::from("ab"));
        let mut overlay = overlay(false);

        let event = overlay.on_key(&mut cell, KeyEvent::shift(KeyCode::Enter));
        assert_eq!(event, OverlayEvent::Edited);
        assert_eq!(cell.local(), "ab\n");
    }

    #[test]
    fn plain_enter_commits_and_tab_navigates() {
        let mut cell = CellState::new(CellKind::Text, Value::from("ab"));
        let mut overlay = overlay(false);

        assert_eq!(
            overlay.on_key(&mut cell, KeyEvent::plain(KeyCode::Enter)),
            OverlayEvent::Commit
        );
        assert_eq!(
            overlay.on_key(&mut cell, KeyEvent::plain(KeyCode::Tab)),
            OverlayEvent::CommitAndNext
        );
        assert_eq!(
            overlay.on_key(&mut cell, KeyEvent::plain(KeyCode::BackTab)),
            OverlayEvent::CommitAndPrev
        );
        assert_eq!(
            overlay.on_key(&mut cell, KeyEvent::plain(KeyCode::Esc)),
            OverlayEvent::Revert
        );
    }

    #[test]
    fn hit_test_covers_helper_line() {
        let overlay = overlay(false);
        // Editor box spans rows 5..10, helper row 10.
        assert!(overlay.hit_test(9, 10));
        assert!(overlay.hit_test(10, 10));
        assert!(!overlay.hit_test(11, 10));
        assert!(!overlay.hit_test(5, 1));
    }

    #[test]
    fn long_content_scrolls_inside_the_box() {
        let mut cell = CellState::new(CellKind::Text, Value::from("a"));
        let mut overlay = overlay(false);
        // Content height is 3 (box height 5 minus borders).
        for _ in 0..5 {
            overlay.on_key(&mut cell, KeyEvent::shift(KeyCode::Enter));
        }
        let (row, _) = overlay.cursor_doc_pos(&cell);
        // Caret stays inside the box even though the 6th line is current.
        assert!(row <= overlay.rect().top + overlay.rect().height - 2);
        assert!(overlay.draw(&cell).len() as i32 == overlay.rect().height + 1);
    }
}
