use chrono::{DateTime, Utc};
use serde::{self, Deserialize, Deserializer, Serializer};

// wal2json commit timestamps
// Example: 2022-06-22 15:38:19.695275+00
// https://docs.rs/chrono/latest/chrono/format/strftime/index.html
const DESER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

// Example: 2000-01-01T00:01:01.000Z
const SER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format(date: &DateTime<Utc>) -> String {
    format!("{}", date.format(SER_FORMAT))
}

pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(s, DESER_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|x| x.with_timezone(&Utc))
}

pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(date))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_wal2json_timestamp() {
        let ts = parse("2022-06-22 15:38:19.695275+00").unwrap();
        assert_eq!(format(&ts), "2022-06-22T15:38:19.695Z");
    }

    #[test]
    fn test_parse_offset_is_normalized() {
        let ts = parse("2022-06-22 17:38:19+02").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2022, 6, 22, 15, 38, 19).unwrap());
    }
}
