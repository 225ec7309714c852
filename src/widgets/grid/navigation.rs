//! Focus resolver over the grid's focusable fields.
//!
//! The field sequence is row-major (rows in order, editable columns within
//! each row) and is rebuilt by the grid on every call, so row inserts and
//! deletes can never leave a stale index behind.

/// Stable identity of one editable field: row id (survives reordering and
/// inserts) plus field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub row_id: u64,
    pub field: String,
}

impl FieldId {
    pub fn new(row_id: u64, field: impl Into<String>) -> Self {
        Self {
            row_id,
            field: field.into(),
        }
    }
}

/// The field after `current`, or `None` at the end (clamped, not wrapped).
/// A `current` that no longer exists also yields `None`: navigation is
/// advisory and focus stays wherever it is.
pub fn next_field(fields: &[FieldId], current: &FieldId) -> Option<FieldId> {
    let at = fields.iter().position(|field| field == current)?;
    fields.get(at + 1).cloned()
}

/// The field before `current`, or `None` at the start.
pub fn previous_field(fields: &[FieldId], current: &FieldId) -> Option<FieldId> {
    let at = fields.iter().position(|field| field == current)?;
    let at = at.checked_sub(1)?;
    fields.get(at).cloned()
}
