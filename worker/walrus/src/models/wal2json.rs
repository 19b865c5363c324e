use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    // absent before include-type-oids was available
    #[serde(default)]
    pub typeoid: Option<u32>,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PrimaryKeyRef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub typeoid: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    I,
    U,
    D,
    T,
    // Begin/Commit/Message and anything newer
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Record {
    pub action: Action,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    pub pk: Option<Vec<PrimaryKeyRef>>,
    pub columns: Option<Vec<Column>>, // option is for truncate/delete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Vec<Column>>, // option is for insert
    // Example: 2022-06-22 15:38:19.695275+00
    #[serde(with = "crate::timestamp_fmt")]
    pub timestamp: DateTime<Utc>,
}

impl Record {
    pub fn pkey_cols(&self) -> Vec<&str> {
        match &self.pk {
            Some(pkey_refs) => pkey_refs.iter().map(|x| x.name.as_str()).collect(),
            None => vec![],
        }
    }

    pub fn has_primary_key(&self) -> bool {
        !self.pkey_cols().is_empty()
    }
}
