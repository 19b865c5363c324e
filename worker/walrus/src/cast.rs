//! Coercion of textual values into SQL types.
//!
//! wal2json hands over column values as JSON scalars and filters store their
//! operand as text. Both are parsed into a [`Datum`] of the declared
//! [`PgType`] and rendered back to the JSON PostgreSQL's `to_jsonb` would
//! produce, so filter comparisons follow SQL semantics rather than JSON ones.

use crate::errors::CastError;
use crate::models::realtime::Op;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PgType {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Numeric,
    Text,
    /// `character(n)`, trailing blanks are insignificant in comparisons
    Bpchar,
    Uuid,
    Json,
    Jsonb,
    Date,
    Time,
    Timestamp,
    Timestamptz,
    Array(Box<PgType>),
    /// User defined types (enums, domains). Values are opaque text.
    Custom(String),
}

impl PgType {
    pub fn from_oid(oid: u32) -> Option<Self> {
        use PgType::*;

        let type_ = match oid {
            16 => Bool,
            20 => Int8,
            21 => Int2,
            23 => Int4,
            26 => Oid,
            18 | 19 | 25 | 1043 => Text,
            1042 => Bpchar,
            114 => Json,
            3802 => Jsonb,
            700 => Float4,
            701 => Float8,
            1700 => Numeric,
            2950 => Uuid,
            1082 => Date,
            1083 => Time,
            1114 => Timestamp,
            1184 => Timestamptz,
            1000 => Bool.array_of(),
            1005 => Int2.array_of(),
            1007 => Int4.array_of(),
            1016 => Int8.array_of(),
            1028 => Oid.array_of(),
            1002 | 1003 | 1009 | 1015 => Text.array_of(),
            1014 => Bpchar.array_of(),
            199 => Json.array_of(),
            3807 => Jsonb.array_of(),
            1021 => Float4.array_of(),
            1022 => Float8.array_of(),
            1231 => Numeric.array_of(),
            2951 => Uuid.array_of(),
            1182 => Date.array_of(),
            1183 => Time.array_of(),
            1115 => Timestamp.array_of(),
            1185 => Timestamptz.array_of(),
            _ => return None,
        };
        Some(type_)
    }

    /// Accepts `format_type` output ("character varying(255)"), `typname`
    /// ("int4") and array spellings ("int4[]", "_int4").
    pub fn from_name(name: &str) -> Option<Self> {
        use PgType::*;

        let name = strip_modifiers(name).to_lowercase();
        let name = name.strip_prefix("pg_catalog.").unwrap_or(&name);

        if let Some(elem) = name.strip_suffix("[]") {
            return Self::from_name(elem).map(|x| x.array_of());
        }
        if let Some(elem) = name.strip_prefix('_') {
            if !elem.is_empty() {
                return Self::from_name(elem).map(|x| x.array_of());
            }
        }

        let type_ = match name {
            "bool" | "boolean" => Bool,
            "int2" | "smallint" | "smallserial" => Int2,
            "int4" | "int" | "integer" | "serial" => Int4,
            "int8" | "bigint" | "bigserial" => Int8,
            "oid" | "regclass" | "regtype" | "regrole" => Oid,
            "float4" | "real" => Float4,
            "float8" | "double precision" => Float8,
            "numeric" | "decimal" => Numeric,
            "text" | "varchar" | "character varying" | "name" | "citext" => Text,
            "char" | "character" | "bpchar" => Bpchar,
            "uuid" => Uuid,
            "json" => Json,
            "jsonb" => Jsonb,
            "date" => Date,
            "time" | "time without time zone" => Time,
            "timestamp" | "timestamp without time zone" => Timestamp,
            "timestamptz" | "timestamp with time zone" => Timestamptz,
            "" => return None,
            other if is_type_identifier(other) => Custom(other.to_string()),
            _ => return None,
        };
        Some(type_)
    }

    /// Resolve a column type preferring the oid, which older decoder
    /// protocol versions may omit.
    pub fn resolve(type_oid: Option<u32>, type_name: &str) -> Option<Self> {
        type_oid
            .and_then(Self::from_oid)
            .or_else(|| Self::from_name(type_name))
    }

    pub fn array_of(&self) -> Self {
        match self {
            Self::Array(_) => self.clone(),
            _ => Self::Array(Box::new(self.clone())),
        }
    }

    /// Name safe to splice into a cast, e.g. `$1::int8`
    pub fn sql_name(&self) -> String {
        use PgType::*;

        match self {
            Bool => "bool".to_string(),
            Int2 => "int2".to_string(),
            Int4 => "int4".to_string(),
            Int8 => "int8".to_string(),
            Oid => "oid".to_string(),
            Float4 => "float4".to_string(),
            Float8 => "float8".to_string(),
            Numeric => "numeric".to_string(),
            Text => "text".to_string(),
            Bpchar => "bpchar".to_string(),
            Uuid => "uuid".to_string(),
            Json => "json".to_string(),
            Jsonb => "jsonb".to_string(),
            Date => "date".to_string(),
            Time => "time".to_string(),
            Timestamp => "timestamp".to_string(),
            Timestamptz => "timestamptz".to_string(),
            Array(elem) => format!("{}[]", elem.sql_name()),
            Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

// Drops type modifiers: "timestamp(3) with time zone" -> "timestamp with time zone"
fn strip_modifiers(name: &str) -> String {
    let mut depth = 0;
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_type_identifier(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == ' ')
}

/// A value of a known SQL type
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(BigDecimal),
    Text(String),
    Bpchar(String),
    Uuid(uuid::Uuid),
    Json(Value),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Timestamptz(DateTime<Utc>),
    Array(Vec<Datum>),
}

impl Datum {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(x) => Value::Bool(*x),
            Self::Int(x) => Value::from(*x),
            Self::Float(x) => serde_json::Number::from_f64(*x)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(float_literal(*x))),
            // the decimal's own text keeps precision and scale ("1.50")
            Self::Numeric(x) => serde_json::Number::from_str(&x.to_string())
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(x.to_string())),
            Self::Text(x) | Self::Bpchar(x) => Value::String(x.clone()),
            Self::Uuid(x) => Value::String(x.hyphenated().to_string()),
            Self::Json(x) => x.clone(),
            Self::Date(x) => Value::String(x.format("%Y-%m-%d").to_string()),
            Self::Time(x) => Value::String(x.format("%H:%M:%S%.f").to_string()),
            Self::Timestamp(x) => Value::String(x.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::Timestamptz(x) => {
                Value::String(x.format("%Y-%m-%dT%H:%M:%S%.f+00:00").to_string())
            }
            Self::Array(items) => Value::Array(items.iter().map(Datum::to_json).collect()),
        }
    }

    fn sql_cmp(&self, other: &Datum) -> Option<Ordering> {
        use Datum::*;

        match (self, other) {
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Numeric(a), Numeric(b)) => a.partial_cmp(b),
            // numeric NaN sorts above every other value, then Infinity
            (Numeric(_), Float(b)) => Some(non_finite_cmp(*b).reverse()),
            (Float(a), Numeric(_)) => Some(non_finite_cmp(*a)),
            (Text(a), Text(b)) => a.partial_cmp(b),
            (Bpchar(a), Bpchar(b)) => a
                .trim_end_matches(' ')
                .partial_cmp(b.trim_end_matches(' ')),
            (Uuid(a), Uuid(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) => a.partial_cmp(b),
            (Time(a), Time(b)) => a.partial_cmp(b),
            (Timestamp(a), Timestamp(b)) => a.partial_cmp(b),
            (Timestamptz(a), Timestamptz(b)) => a.partial_cmp(b),
            (Array(a), Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.sql_cmp(y)? {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                a.len().partial_cmp(&b.len())
            }
            _ => None,
        }
    }
}

// Order of a non-finite numeric against any finite one
fn non_finite_cmp(x: f64) -> Ordering {
    if x.is_nan() || x > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x > 0.0 {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Parse `value` as a literal of `type_`
pub fn parse(value: &str, type_: &PgType) -> Result<Datum, CastError> {
    let invalid = || CastError::InvalidInput {
        type_name: type_.to_string(),
        value: value.to_string(),
    };
    let trimmed = value.trim();

    match type_ {
        PgType::Bool => parse_bool(trimmed).map(Datum::Bool).ok_or_else(invalid),
        PgType::Int2 => parse_int(trimmed, i16::MIN as i64, i16::MAX as i64).ok_or_else(invalid),
        PgType::Int4 => parse_int(trimmed, i32::MIN as i64, i32::MAX as i64).ok_or_else(invalid),
        PgType::Int8 => parse_int(trimmed, i64::MIN, i64::MAX).ok_or_else(invalid),
        PgType::Oid => parse_int(trimmed, 0, u32::MAX as i64).ok_or_else(invalid),
        PgType::Float4 | PgType::Float8 => parse_float(trimmed)
            .map(Datum::Float)
            .ok_or_else(invalid),
        PgType::Numeric => parse_numeric(trimmed).ok_or_else(invalid),
        PgType::Text | PgType::Custom(_) => Ok(Datum::Text(value.to_string())),
        PgType::Bpchar => Ok(Datum::Bpchar(value.to_string())),
        PgType::Uuid => uuid::Uuid::parse_str(trimmed)
            .map(Datum::Uuid)
            .map_err(|_| invalid()),
        PgType::Json | PgType::Jsonb => serde_json::from_str(value)
            .map(Datum::Json)
            .map_err(|_| invalid()),
        PgType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Datum::Date)
            .map_err(|_| invalid()),
        PgType::Time => NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map(Datum::Time)
            .map_err(|_| invalid()),
        PgType::Timestamp => parse_timestamp(trimmed)
            .map(Datum::Timestamp)
            .ok_or_else(invalid),
        PgType::Timestamptz => parse_timestamptz(trimmed)
            .map(Datum::Timestamptz)
            .ok_or_else(invalid),
        PgType::Array(elem) => {
            let items = parse_array(value).ok_or_else(invalid)?;
            items
                .into_iter()
                .map(|item| match item {
                    Some(x) => parse(&x, elem),
                    None => Ok(Datum::Null),
                })
                .collect::<Result<Vec<Datum>, CastError>>()
                .map(Datum::Array)
        }
    }
}

/// Render `value` as `type_`, coerced to JSON
pub fn cast(value: &str, type_: &PgType) -> Result<Value, CastError> {
    parse(value, type_).map(|x| x.to_json())
}

/// Evaluate `lhs <op> rhs` with both operands cast to `type_`.
/// `in` casts `rhs` to `type_[]` and tests membership (`= ANY`).
pub fn compare(op: Op, type_: &PgType, lhs: &str, rhs: &str) -> Result<bool, CastError> {
    let left = parse(lhs, type_)?;

    let candidates = match op {
        Op::In => match parse(rhs, &type_.array_of())? {
            Datum::Array(items) => items,
            other => vec![other],
        },
        _ => vec![parse(rhs, type_)?],
    };

    for right in candidates {
        if holds(op, &left, &right, type_)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn holds(op: Op, left: &Datum, right: &Datum, type_: &PgType) -> Result<bool, CastError> {
    // comparisons against NULL are never true
    if *left == Datum::Null || *right == Datum::Null {
        return Ok(false);
    }

    let unsupported = || CastError::UnsupportedOp {
        op: op.symbol().to_string(),
        type_name: type_.to_string(),
    };

    if let (Datum::Json(a), Datum::Json(b)) = (left, right) {
        return match op {
            Op::Equal | Op::In => Ok(a == b),
            Op::NotEqual => Ok(a != b),
            _ => Err(unsupported()),
        };
    }

    let ordering = left.sql_cmp(right).ok_or_else(unsupported)?;
    Ok(match op {
        Op::Equal | Op::In => ordering == Ordering::Equal,
        Op::NotEqual => ordering != Ordering::Equal,
        Op::LessThan => ordering == Ordering::Less,
        Op::LessThanOrEqual => ordering != Ordering::Greater,
        Op::GreaterThan => ordering == Ordering::Greater,
        Op::GreaterThanOrEqual => ordering != Ordering::Less,
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_int(s: &str, min: i64, max: i64) -> Option<Datum> {
    s.parse::<i64>()
        .ok()
        .filter(|x| (min..=max).contains(x))
        .map(Datum::Int)
}

fn parse_float(s: &str) -> Option<f64> {
    match s.to_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "infinity" | "+infinity" | "inf" => Some(f64::INFINITY),
        "-infinity" | "-inf" => Some(f64::NEG_INFINITY),
        other => other.parse::<f64>().ok(),
    }
}

fn parse_numeric(s: &str) -> Option<Datum> {
    if let Ok(x) = BigDecimal::from_str(s) {
        return Some(Datum::Numeric(x));
    }
    parse_float(s)
        .filter(|x| !x.is_finite())
        .map(Datum::Float)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|x| x.and_hms_opt(0, 0, 0))
        })
}

fn parse_timestamptz(s: &str) -> Option<DateTime<Utc>> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

    FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok())
        .map(|x| x.with_timezone(&Utc))
        // no offset given: read as UTC
        .or_else(|| parse_timestamp(s).map(|x| Utc.from_utc_datetime(&x)))
}

/// Splits a one dimensional array literal, `{a,"b c",NULL}` or `["a","b c",null]`.
/// `None` elements are SQL NULLs.
fn parse_array(value: &str) -> Option<Vec<Option<String>>> {
    let trimmed = value.trim();

    if trimmed.starts_with('[') {
        let items: Vec<Value> = serde_json::from_str(trimmed).ok()?;
        return Some(
            items
                .into_iter()
                .map(|x| match x {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                })
                .collect(),
        );
    }

    let inner = trimmed.strip_prefix('{')?.strip_suffix('}')?;
    let mut items = vec![];
    if inner.trim().is_empty() {
        return Some(items);
    }

    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }

        let item = if chars.peek() == Some(&'"') {
            chars.next();
            let mut buf = String::new();
            loop {
                match chars.next()? {
                    '\\' => buf.push(chars.next()?),
                    '"' => break,
                    c => buf.push(c),
                }
            }
            Some(buf)
        } else {
            let mut buf = String::new();
            while let Some(&c) = chars.peek() {
                match c {
                    ',' => break,
                    // nested arrays are not supported
                    '{' | '}' | '"' => return None,
                    _ => {
                        buf.push(c);
                        chars.next();
                    }
                }
            }
            let buf = buf.trim();
            if buf.is_empty() {
                return None;
            }
            if buf.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(buf.to_string())
            }
        };
        items.push(item);

        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(PgType::from_name("integer"), Some(PgType::Int4));
        assert_eq!(PgType::from_name("character varying(255)"), Some(PgType::Text));
        assert_eq!(
            PgType::from_name("timestamp(3) with time zone"),
            Some(PgType::Timestamptz)
        );
        assert_eq!(PgType::from_name("_int8"), Some(PgType::Int8.array_of()));
        assert_eq!(PgType::from_name("text[]"), Some(PgType::Text.array_of()));
        assert_eq!(
            PgType::from_name("mood"),
            Some(PgType::Custom("mood".to_string()))
        );
        assert_eq!(PgType::from_name(""), None);
        assert_eq!(PgType::from_name("int4; drop table x"), None);
    }

    #[test]
    fn test_resolve_prefers_oid() {
        assert_eq!(PgType::resolve(Some(20), "text"), Some(PgType::Int8));
        // user defined type oids fall back to the name
        assert_eq!(
            PgType::resolve(Some(16_500), "mood"),
            Some(PgType::Custom("mood".to_string()))
        );
        assert_eq!(PgType::resolve(None, "bool"), Some(PgType::Bool));
    }

    #[test]
    fn test_cast_scalars() {
        assert_eq!(cast("42", &PgType::Int4).unwrap(), json!(42));
        assert_eq!(cast("t", &PgType::Bool).unwrap(), json!(true));
        assert_eq!(cast("1.5", &PgType::Float8).unwrap(), json!(1.5));
        assert_eq!(cast("NaN", &PgType::Float8).unwrap(), json!("NaN"));
        assert_eq!(cast("hello", &PgType::Text).unwrap(), json!("hello"));
        assert_eq!(
            cast("{\"a\": 1}", &PgType::Jsonb).unwrap(),
            json!({"a": 1})
        );
        assert_eq!(
            cast("A0EEBC99-9C0B-4EF8-BB6D-6BB9BD380A11", &PgType::Uuid).unwrap(),
            json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11")
        );
    }

    #[test]
    fn test_cast_temporal() {
        assert_eq!(
            cast("2022-06-22 15:38:19", &PgType::Timestamp).unwrap(),
            json!("2022-06-22T15:38:19")
        );
        assert_eq!(
            cast("2022-06-22 17:38:19+02", &PgType::Timestamptz).unwrap(),
            json!("2022-06-22T15:38:19+00:00")
        );
        assert_eq!(cast("2022-06-22", &PgType::Date).unwrap(), json!("2022-06-22"));
    }

    #[test]
    fn test_cast_failures() {
        assert_eq!(
            cast("abc", &PgType::Int4),
            Err(CastError::InvalidInput {
                type_name: "int4".to_string(),
                value: "abc".to_string()
            })
        );
        assert!(cast("70000", &PgType::Int2).is_err());
        assert!(cast("not-a-uuid", &PgType::Uuid).is_err());
    }

    #[test]
    fn test_cast_arrays() {
        let int_array = PgType::Int4.array_of();
        assert_eq!(cast("{1,2,3}", &int_array).unwrap(), json!([1, 2, 3]));
        assert_eq!(cast("[1, 2, 3]", &int_array).unwrap(), json!([1, 2, 3]));
        assert_eq!(cast("{}", &int_array).unwrap(), json!([]));
        assert_eq!(
            cast(r#"{a,"b c",NULL,"d\"e"}"#, &PgType::Text.array_of()).unwrap(),
            json!(["a", "b c", null, "d\"e"])
        );
        assert!(cast("{1,x}", &int_array).is_err());
        assert!(cast("{{1,2},{3,4}}", &int_array).is_err());
        assert!(cast("1,2", &int_array).is_err());
    }

    #[test]
    fn test_compare_ops() {
        let t = PgType::Int8;
        assert!(compare(Op::Equal, &t, "1", "1").unwrap());
        assert!(compare(Op::NotEqual, &t, "1", "2").unwrap());
        assert!(compare(Op::LessThan, &t, "1", "2").unwrap());
        assert!(compare(Op::LessThanOrEqual, &t, "2", "2").unwrap());
        assert!(compare(Op::GreaterThan, &t, "10", "9").unwrap());
        assert!(compare(Op::GreaterThanOrEqual, &t, "9", "9").unwrap());
        assert!(!compare(Op::GreaterThan, &t, "9", "10").unwrap());
    }

    #[test]
    fn test_compare_uses_sql_type_not_text() {
        // "10" < "9" as text, but not as integers
        assert!(!compare(Op::LessThan, &PgType::Int4, "10", "9").unwrap());
        assert!(compare(Op::LessThan, &PgType::Text, "10", "9").unwrap());
        assert!(compare(Op::Equal, &PgType::Numeric, "1.50", "1.5").unwrap());
        assert!(compare(
            Op::LessThan,
            &PgType::Timestamptz,
            "2022-06-22T15:00:00+00:00",
            "2022-06-22 16:30:00+01"
        )
        .unwrap());
    }

    #[test]
    fn test_numeric_is_exact() {
        let t = PgType::Numeric;
        assert!(!compare(Op::Equal, &t, "0.1000000000000000001", "0.1").unwrap());
        assert!(compare(Op::GreaterThan, &t, "0.1000000000000000001", "0.1").unwrap());
        assert!(!compare(Op::Equal, &t, "9007199254740993", "9007199254740992.0").unwrap());
        assert!(compare(Op::In, &t, "2.50", "{1,2.5}").unwrap());

        assert_eq!(
            cast("12345678901234567890.12", &t).unwrap().to_string(),
            "12345678901234567890.12"
        );
        assert_eq!(cast("1.50", &t).unwrap().to_string(), "1.50");
        assert_eq!(cast("NaN", &t).unwrap(), json!("NaN"));
        assert!(compare(Op::LessThan, &t, "1e300", "Infinity").unwrap());
        assert!(cast("1.5.0", &t).is_err());
    }

    #[test]
    fn test_bpchar_ignores_trailing_blanks() {
        let t = PgType::from_oid(1042).unwrap();
        assert_eq!(t, PgType::Bpchar);
        assert_eq!(PgType::from_name("character(3)"), Some(PgType::Bpchar));
        assert_eq!(PgType::from_oid(1014), Some(PgType::Bpchar.array_of()));

        assert!(compare(Op::Equal, &t, "US ", "US").unwrap());
        assert!(!compare(Op::NotEqual, &t, "US ", "US").unwrap());
        assert!(compare(Op::In, &PgType::Bpchar, "GB  ", "{US,GB}").unwrap());
        // leading blanks are significant
        assert!(!compare(Op::Equal, &t, " US", "US").unwrap());
        // varchar keeps them
        assert!(!compare(Op::Equal, &PgType::Text, "US ", "US").unwrap());
        // the padded value is what the row holds
        assert_eq!(cast("US ", &t).unwrap(), json!("US "));
    }

    #[test]
    fn test_compare_in() {
        let t = PgType::Text;
        assert!(compare(Op::In, &t, "shipped", "{pending,shipped}").unwrap());
        assert!(!compare(Op::In, &t, "lost", "{pending,shipped}").unwrap());
        assert!(compare(Op::In, &PgType::Int4, "2", "{1,2,3}").unwrap());
        // NULL members never match
        assert!(!compare(Op::In, &PgType::Int4, "2", "{NULL}").unwrap());
    }

    #[test]
    fn test_compare_failures() {
        assert!(compare(Op::Equal, &PgType::Int4, "1", "one").is_err());
        assert_eq!(
            compare(Op::LessThan, &PgType::Jsonb, "1", "2"),
            Err(CastError::UnsupportedOp {
                op: "<".to_string(),
                type_name: "jsonb".to_string()
            })
        );
        assert!(compare(Op::Equal, &PgType::Jsonb, "{\"a\":1}", "{\"a\": 1}").unwrap());
    }
}
