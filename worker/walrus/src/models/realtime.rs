use crate::errors::CastError;
use crate::models::wal2json;
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql, WriteTuple};
use diesel::sql_types::{Record, Text};
use diesel::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    INSERT,
    UPDATE,
    DELETE,
    TRUNCATE,
    ERROR,
}

impl Action {
    pub fn from_wal2json(action: &wal2json::Action) -> Self {
        match action {
            wal2json::Action::I => Self::INSERT,
            wal2json::Action::U => Self::UPDATE,
            wal2json::Action::D => Self::DELETE,
            wal2json::Action::T => Self::TRUNCATE,
            wal2json::Action::Other => Self::ERROR,
        }
    }

    /// Row level changes are the only ones broadcast to subscribers
    pub fn is_row_change(&self) -> bool {
        matches!(self, Self::INSERT | Self::UPDATE | Self::DELETE)
    }
}

/// A table, identified by name as wal2json reports it
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Entity {
    pub schema: String,
    pub table: String,
}

impl Entity {
    pub fn new(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(rename(serialize = "type", deserialize = "type"))]
    pub type_: String,
}

/// The change event delivered to subscribers
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Data {
    pub schema: String,
    pub table: String,
    pub r#type: Action,
    #[serde(with = "crate::timestamp_fmt")]
    pub commit_timestamp: DateTime<Utc>,
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Map<String, Value>>,
}

/// Outcome of dispatching one WAL record for one working role
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DispatchResult {
    #[serde(rename = "wal")]
    pub event: Data,
    pub is_rls_enabled: bool,
    #[serde(rename = "subscription_ids")]
    pub visible_subscription_ids: Vec<uuid::Uuid>,
    pub errors: Vec<String>,
    /// Subscriptions of the role that were refused the record by the primary
    /// key gates. They receive the errors instead of the event.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_subscription_ids: Vec<uuid::Uuid>,
}

impl DispatchResult {
    /// Anything to hand to the transport
    pub fn is_deliverable(&self) -> bool {
        !self.visible_subscription_ids.is_empty() || !self.rejected_subscription_ids.is_empty()
    }
}

// Subscriptions
#[derive(Serialize, Deserialize, Clone, Debug, Queryable, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub subscription_id: uuid::Uuid,
    pub entity: u32,
    pub filters: Vec<UserDefinedFilter>,
    pub claims: Value,
    pub claims_role: String,
    pub created_at: NaiveDateTime,
    pub schema_name: String,
    pub table_name: String,
}

impl Subscription {
    pub fn watches(&self, entity: &Entity) -> bool {
        self.schema_name == entity.schema && self.table_name == entity.table
    }

    pub fn entity(&self) -> Entity {
        Entity::new(&self.schema_name, &self.table_name)
    }
}

/// The role a subscription acts as, `claims ->> 'role'`
pub fn role_from_claims(claims: &Value) -> Option<&str> {
    claims.get("role").and_then(Value::as_str)
}

#[derive(SqlType, PartialEq)]
#[diesel(postgres_type(schema = "realtime", name = "equality_op"))]
pub struct OpType;

/// Variant order matches the `realtime.equality_op` enum, which defines the
/// canonical sort order of filters.
#[derive(
    Debug,
    PartialEq,
    FromSqlRow,
    AsExpression,
    Clone,
    Copy,
    Deserialize,
    Serialize,
    Eq,
    Ord,
    PartialOrd,
    Hash,
)]
#[diesel(sql_type = OpType)]
pub enum Op {
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "neq")]
    NotEqual,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    LessThanOrEqual,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
    #[serde(rename = "in")]
    In,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Equal => "eq",
            Op::NotEqual => "neq",
            Op::LessThan => "lt",
            Op::LessThanOrEqual => "lte",
            Op::GreaterThan => "gt",
            Op::GreaterThanOrEqual => "gte",
            Op::In => "in",
        }
    }

    /// SQL operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Equal => "=",
            Op::NotEqual => "<>",
            Op::LessThan => "<",
            Op::LessThanOrEqual => "<=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEqual => ">=",
            Op::In => "= ANY",
        }
    }
}

impl FromStr for Op {
    type Err = CastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Op::Equal),
            "neq" => Ok(Op::NotEqual),
            "lt" => Ok(Op::LessThan),
            "lte" => Ok(Op::LessThanOrEqual),
            "gt" => Ok(Op::GreaterThan),
            "gte" => Ok(Op::GreaterThanOrEqual),
            "in" => Ok(Op::In),
            other => Err(CastError::UnknownOp(other.to_string())),
        }
    }
}

impl ToSql<OpType, Pg> for Op {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<OpType, Pg> for Op {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let s = std::str::from_utf8(bytes.as_bytes())?;
        Ok(s.parse::<Op>()?)
    }
}

#[derive(SqlType, PartialEq, QueryId)]
#[diesel(postgres_type(schema = "realtime", name = "user_defined_filter"))]
pub struct UserDefinedFilterType;

/// Field order gives the canonical `(column_name, op, value)` sort
#[derive(
    Debug,
    PartialEq,
    FromSqlRow,
    AsExpression,
    Clone,
    Deserialize,
    Serialize,
    Eq,
    Ord,
    PartialOrd,
    Hash,
)]
#[diesel(sql_type = UserDefinedFilterType)]
pub struct UserDefinedFilter {
    pub column_name: String,
    pub op: Op,
    pub value: String,
}

impl UserDefinedFilter {
    pub fn new(column_name: &str, op: Op, value: &str) -> Self {
        Self {
            column_name: column_name.to_string(),
            op,
            value: value.to_string(),
        }
    }
}

impl ToSql<UserDefinedFilterType, Pg> for UserDefinedFilter {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        WriteTuple::<(Text, OpType, Text)>::write_tuple(
            &(self.column_name.as_str(), &self.op, self.value.as_str()),
            out,
        )
    }
}

impl FromSql<UserDefinedFilterType, Pg> for UserDefinedFilter {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let (column_name, op, value) =
            FromSql::<Record<(Text, OpType, Text)>, Pg>::from_sql(bytes)?;
        Ok(UserDefinedFilter {
            column_name,
            op,
            value,
        })
    }
}
