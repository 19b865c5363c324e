//! Builds the change event a role receives for a WAL record

use crate::decoder::Change;
use crate::errors::RowError;
use crate::models::realtime::{self, Action, Data};
use crate::models::walrus;
use serde_json::{Map, Value};

/// Once a record exceeds `max_record_bytes`, fields larger than this are
/// dropped from `record` and `old_record`.
pub const MAX_FIELD_BYTES: usize = 64;

/// `{schema, table, type, commit_timestamp}` without any row data
pub fn skeleton(change: &Change) -> Data {
    Data {
        schema: change.entity.schema.clone(),
        table: change.entity.table.clone(),
        r#type: change.action,
        commit_timestamp: change.commit_timestamp,
        columns: vec![],
        record: None,
        old_record: None,
    }
}

/// `columns` and `old_columns` carry `is_selectable` for the acting role,
/// `selectable` is the role's column metadata in column position order.
pub fn assemble(
    change: &Change,
    columns: &[walrus::Column],
    old_columns: &[walrus::Column],
    selectable: &[realtime::Column],
    is_rls_enabled: bool,
    max_record_bytes: usize,
) -> (Data, Option<RowError>) {
    let exceeds_max_size = change.size_bytes > max_record_bytes;
    let include = |col: &walrus::Column| {
        col.is_selectable && (!exceeds_max_size || col.value_bytes() <= MAX_FIELD_BYTES)
    };

    let record = match change.action {
        Action::INSERT | Action::UPDATE => {
            let mut record = to_map(columns.iter().filter(|x| include(*x)));
            // unchanged TOAST values are missing from the new image
            for col in old_columns {
                if include(col) && !columns.iter().any(|x| x.name == col.name) {
                    record.insert(col.name.clone(), col.value.clone());
                }
            }
            Some(record)
        }
        _ => None,
    };

    let old_record = match change.action {
        Action::UPDATE => Some(to_map(old_columns.iter().filter(|x| include(*x)))),
        // only the identity of a deleted row is revealed when RLS is on
        Action::DELETE => Some(to_map(
            old_columns
                .iter()
                .filter(|x| include(*x) && (!is_rls_enabled || x.is_pkey)),
        )),
        _ => None,
    };

    let event = Data {
        columns: selectable.to_vec(),
        record,
        old_record,
        ..skeleton(change)
    };

    let error = if exceeds_max_size {
        Some(RowError::PayloadTooLarge)
    } else {
        None
    };
    (event, error)
}

fn to_map<'a>(columns: impl Iterator<Item = &'a walrus::Column>) -> Map<String, Value> {
    columns
        .map(|x| (x.name.clone(), x.value.clone()))
        .collect()
}
