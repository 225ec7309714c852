use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::core::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowType {
    #[default]
    Main,
    /// Carries extra lines of a logical item (no row number, usually fewer
    /// editable fields).
    Continuation,
}

/// One grid row, owned by the data layer and handed to the grid by value on
/// every `set_rows`. All structural changes travel back as `GridAction`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRow {
    pub id: u64,
    #[serde(default)]
    pub row_type: RowType,
    /// Field name → committed value. Iteration order is presentation order
    /// for fields not covered by the column list.
    #[serde(default)]
    pub data: IndexMap<String, Value>,
    /// Fields the user may edit on this row.
    #[serde(default)]
    pub editable_fields: IndexSet<String>,
    #[serde(default = "enabled")]
    pub can_add_row: bool,
    #[serde(default = "enabled")]
    pub can_duplicate: bool,
    #[serde(default = "enabled")]
    pub can_delete: bool,
    #[serde(default = "enabled")]
    pub show_row_number: bool,
    /// Overrides the positional number in the gutter when set.
    #[serde(default)]
    pub display_number: Option<String>,
}

fn enabled() -> bool {
    true
}

impl GridRow {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            row_type: RowType::Main,
            data: IndexMap::new(),
            editable_fields: IndexSet::new(),
            can_add_row: true,
            can_duplicate: true,
            can_delete: true,
            show_row_number: true,
            display_number: None,
        }
    }

    pub fn continuation(mut self) -> Self {
        self.row_type = RowType::Continuation;
        self.show_row_number = false;
        self
    }

    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    pub fn editable(mut self, field: impl Into<String>) -> Self {
        self.editable_fields.insert(field.into());
        self
    }

    pub fn with_display_number(mut self, number: impl Into<String>) -> Self {
        self.display_number = Some(number.into());
        self
    }

    pub fn value(&self, field: &str) -> &Value {
        self.data.get(field).unwrap_or(&Value::None)
    }

    pub fn is_editable(&self, field: &str) -> bool {
        self.editable_fields.contains(field)
    }
}

#[cfg(test)]
mod tests {
    use super::{GridRow, RowType};

    #[test]
    fn deserializes_with_capability_defaults() {
        let row: GridRow = serde_json::from_str(
            r#"{ "id": 7, "data": { "description": "Channel letters", "qty": 3 },
                 "editable_fields": ["description", "qty"] }"#,
        )
        .expect("row json");

        assert_eq!(row.id, 7);
        assert_eq!(row.row_type, RowType::Main);
        assert!(row.can_add_row && row.can_duplicate && row.can_delete);
        assert!(row.show_row_number);
        assert_eq!(row.value("qty").as_number(), Some(3.0));
        assert!(row.is_editable("description"));
        assert!(!row.is_editable("total"));
    }

    #[test]
    fn continuation_rows_hide_their_number() {
        let row = GridRow::new(2).continuation();
        assert_eq!(row.row_type, RowType::Continuation);
        assert!(!row.show_row_number);
    }

    #[test]
    fn missing_fields_read_as_none() {
        let row = GridRow::new(1).with_value("description", "Sign face");
        assert!(row.value("qty").is_none());
    }
}
