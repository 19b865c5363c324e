use serde::Serialize;

/// A decoded column of a WAL record. `is_selectable` depends on the role
/// the record is being dispatched for and is filled in per role.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub type_name: String,
    pub type_oid: Option<u32>,
    pub value: serde_json::Value,
    pub is_pkey: bool,
    pub is_selectable: bool,
}

impl Column {
    /// Text form of the value, as `value #>> '{}'` would give. `None` for NULL.
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::Null => None,
            serde_json::Value::String(x) => Some(x.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Bytes the value occupies in the serialized payload
    pub fn value_bytes(&self) -> usize {
        self.value.to_string().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(value: serde_json::Value) -> Column {
        Column {
            name: "x".to_string(),
            type_name: "text".to_string(),
            type_oid: None,
            value,
            is_pkey: false,
            is_selectable: false,
        }
    }

    #[test]
    fn test_value_text() {
        assert_eq!(column(json!("abc")).value_text(), Some("abc".to_string()));
        assert_eq!(column(json!(12)).value_text(), Some("12".to_string()));
        assert_eq!(column(json!([1, 2])).value_text(), Some("[1,2]".to_string()));
        assert_eq!(column(json!(null)).value_text(), None);
    }

    #[test]
    fn test_value_bytes_counts_quotes() {
        assert_eq!(column(json!("abc")).value_bytes(), 5);
    }
}
