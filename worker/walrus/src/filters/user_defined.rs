use crate::cast::{self, PgType};
use crate::models::realtime::UserDefinedFilter;
use crate::models::walrus;
use log::{debug, warn};

/// True when every filter matches the row. An empty filter list matches all
/// rows. Filters that can not be evaluated (unknown or unselectable column,
/// unresolvable type, failed cast) do not match.
pub fn is_visible(columns: &[walrus::Column], filters: &[UserDefinedFilter]) -> bool {
    filters.iter().all(|filter| filter_matches(columns, filter))
}

fn filter_matches(columns: &[walrus::Column], filter: &UserDefinedFilter) -> bool {
    let column = match columns.iter().find(|x| x.name == filter.column_name) {
        Some(col) => col,
        // The filter references a column that does not exist
        None => {
            warn!(
                "Attempted to filter non-existing column {}",
                filter.column_name
            );
            return false;
        }
    };

    // Privileges may have been revoked since the subscription was validated
    if !column.is_selectable {
        debug!(
            "Attempted to filter unselectable column {}",
            filter.column_name
        );
        return false;
    }

    let type_ = match PgType::resolve(column.type_oid, &column.type_name) {
        Some(t) => t,
        None => {
            warn!(
                "Failed to resolve type {} of column {}",
                column.type_name, column.name
            );
            return false;
        }
    };

    // comparisons with NULL are never true
    let value = match column.value_text() {
        Some(x) => x,
        None => return false,
    };

    match cast::compare(filter.op, &type_, &value, &filter.value) {
        Ok(is_match) => is_match,
        Err(err) => {
            warn!(
                "Failed to evaluate filter {} {} {}: {}",
                filter.column_name,
                filter.op.as_str(),
                filter.value,
                err
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::realtime::Op;
    use serde_json::{json, Value};

    fn column(name: &str, type_name: &str, value: Value) -> walrus::Column {
        walrus::Column {
            name: name.to_string(),
            type_name: type_name.to_string(),
            type_oid: None,
            value,
            is_pkey: name == "id",
            is_selectable: true,
        }
    }

    fn row() -> Vec<walrus::Column> {
        vec![
            column("id", "int8", json!(12)),
            column("status", "text", json!("shipped")),
            column("price", "numeric", json!(9.5)),
            column("note", "text", Value::Null),
        ]
    }

    #[test]
    fn test_no_filters_is_visible() {
        assert!(is_visible(&row(), &[]));
        assert!(is_visible(&[], &[]));
    }

    #[test]
    fn test_filters_are_anded() {
        let status = UserDefinedFilter::new("status", Op::Equal, "shipped");
        let cheap = UserDefinedFilter::new("price", Op::LessThan, "10");
        let pricey = UserDefinedFilter::new("price", Op::GreaterThan, "10");

        assert!(is_visible(&row(), &[status.clone(), cheap]));
        assert!(!is_visible(&row(), &[status, pricey]));
    }

    #[test]
    fn test_numeric_comparison_is_typed() {
        let filter = UserDefinedFilter::new("id", Op::GreaterThan, "9");
        assert!(is_visible(&row(), &[filter]));
    }

    #[test]
    fn test_padded_char_column_matches_unpadded_filter() {
        let columns = vec![column("country", "character(3)", json!("US "))];
        let filter = UserDefinedFilter::new("country", Op::Equal, "US");
        assert!(is_visible(&columns, &[filter]));
    }

    #[test]
    fn test_numeric_filter_is_exact() {
        let columns = vec![column("amount", "numeric", json!(0.1))];
        let filter = UserDefinedFilter::new("amount", Op::Equal, "0.1000000000000000001");
        assert!(!is_visible(&columns, &[filter]));
    }

    #[test]
    fn test_in_filter() {
        let filter = UserDefinedFilter::new("id", Op::In, "{1,12,30}");
        assert!(is_visible(&row(), &[filter]));

        let filter = UserDefinedFilter::new("id", Op::In, "{1,30}");
        assert!(!is_visible(&row(), &[filter]));
    }

    #[test]
    fn test_missing_column_fails_closed() {
        let filter = UserDefinedFilter::new("missing", Op::Equal, "x");
        assert!(!is_visible(&row(), &[filter]));
    }

    #[test]
    fn test_unselectable_column_fails_closed() {
        let mut columns = row();
        columns[1].is_selectable = false;
        let filter = UserDefinedFilter::new("status", Op::Equal, "shipped");
        assert!(!is_visible(&columns, &[filter]));
    }

    #[test]
    fn test_cast_failure_fails_closed() {
        let filter = UserDefinedFilter::new("id", Op::Equal, "twelve");
        assert!(!is_visible(&row(), &[filter]));
    }

    #[test]
    fn test_null_never_matches() {
        let eq = UserDefinedFilter::new("note", Op::Equal, "x");
        let neq = UserDefinedFilter::new("note", Op::NotEqual, "x");
        assert!(!is_visible(&row(), &[eq]));
        assert!(!is_visible(&row(), &[neq]));
    }
}
