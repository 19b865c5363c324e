//! wal2json record -> typed columns

use crate::cast::{self, PgType};
use crate::errors::Error;
use crate::models::realtime::{Action, Entity};
use crate::models::{wal2json, walrus};
use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

/// A decoded WAL record. Column privileges are not known yet, every
/// column starts out with `is_selectable = false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub action: Action,
    pub entity: Entity,
    pub commit_timestamp: DateTime<Utc>,
    /// New row image, empty for DELETE
    pub columns: Vec<walrus::Column>,
    /// Old row image (replica identity), empty for INSERT
    pub old_columns: Vec<walrus::Column>,
    pub has_primary_key: bool,
    /// Size of the raw record, checked against `max_record_bytes`
    pub size_bytes: usize,
}

pub fn parse_line(line: &str) -> Result<wal2json::Record, Error> {
    serde_json::from_str(line)
        .map_err(|x| Error::Parse(format!("Failed to parse wal2json record: {}", x)))
}

pub fn decode_line(line: &str) -> Result<Change, Error> {
    let rec = parse_line(line)?;
    Ok(decode(&rec, line.len()))
}

pub fn decode(rec: &wal2json::Record, size_bytes: usize) -> Change {
    let pkeys = rec.pkey_cols();
    let empty = vec![];

    Change {
        action: Action::from_wal2json(&rec.action),
        entity: Entity::new(&rec.schema, &rec.table),
        commit_timestamp: rec.timestamp,
        columns: decode_columns(rec.columns.as_ref().unwrap_or(&empty), &pkeys),
        old_columns: decode_columns(rec.identity.as_ref().unwrap_or(&empty), &pkeys),
        has_primary_key: !pkeys.is_empty(),
        size_bytes,
    }
}

fn decode_columns(columns: &[wal2json::Column], pkeys: &[&str]) -> Vec<walrus::Column> {
    columns
        .iter()
        .map(|col| walrus::Column {
            name: col.name.clone(),
            type_name: col.type_.clone(),
            type_oid: col.typeoid,
            value: decode_value(col),
            is_pkey: pkeys.contains(&col.name.as_str()),
            is_selectable: false,
        })
        .collect()
}

// Casting failures keep the literal text so the column is never dropped
fn decode_value(col: &wal2json::Column) -> Value {
    let text = match &col.value {
        Value::Null => return Value::Null,
        Value::String(x) => x.clone(),
        other => other.to_string(),
    };

    let type_ = match PgType::resolve(col.typeoid, &col.type_) {
        Some(t) => t,
        None => {
            warn!(
                "Could not resolve type for column {}: type={}, typeoid={:?}",
                col.name, col.type_, col.typeoid
            );
            return Value::String(text);
        }
    };

    match cast::cast(&text, &type_) {
        Ok(v) => v,
        Err(err) => {
            warn!("Failed to cast column {}: {}", col.name, err);
            Value::String(text)
        }
    }
}
