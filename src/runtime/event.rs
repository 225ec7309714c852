use crate::core::value::Value;
use crate::terminal::TerminalEvent;

/// Intents emitted by the grid in `InteractionResult`. These flow upward to
/// the data layer, which owns the row collection and all persistence; the
/// grid itself never mutates rows and never awaits a response. A corrected
/// row set arriving through `Grid::set_rows` is the only feedback channel.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAction {
    /// Fired on every keystroke in an editable cell. Cheap, advisory.
    ValueChanged {
        row_index: usize,
        field: String,
        value: String,
    },
    /// Fired once when an edit commits (blur, Enter, Tab, outside click).
    CommitField {
        row_index: usize,
        field: String,
        value: Value,
    },
    InsertRowAfter {
        index: usize,
    },
    DeleteRow {
        index: usize,
    },
    DuplicateRow {
        index: usize,
    },
    SelectCategory {
        index: usize,
        category_id: String,
    },
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Terminal(TerminalEvent),
    Action(GridAction),
}
