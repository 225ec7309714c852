use serde::{Deserialize, Serialize};

/// Scalar cell value as supplied by the data layer.
///
/// The grid never mutates a committed `Value`; it only reads it to seed and
/// resynchronize edit buffers, and produces new ones when a commit fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    None,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The editable text form of the value: what lands in a cell's buffer
    /// when it is (re)synchronized against the committed value.
    pub fn to_edit_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => format_number(*number),
            Self::None => String::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

/// Render a number without a trailing `.0` for whole values.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Value, format_number};

    #[test]
    fn whole_numbers_have_no_decimal_tail() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn edit_text_of_none_is_empty() {
        assert_eq!(Value::None.to_edit_text(), "");
        assert_eq!(Value::Text("abc".to_string()).to_edit_text(), "abc");
        assert_eq!(Value::Number(40.0).to_edit_text(), "40");
    }

    #[test]
    fn untagged_serde_reads_plain_scalars() {
        let value: Value = serde_json::from_str("\"letters\"").expect("text");
        assert_eq!(value.as_text(), Some("letters"));

        let value: Value = serde_json::from_str("12.5").expect("number");
        assert_eq!(value.as_number(), Some(12.5));

        let value: Value = serde_json::from_str("null").expect("null");
        assert!(value.is_none());
    }
}
