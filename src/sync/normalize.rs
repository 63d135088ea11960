//! Decoding of connector-supplied user and punch records.
//!
//! Connector firmware bridges disagree on field names, so a record is
//! decoded into a fixed set of optional [`Scalar`] slots and then resolved
//! through two named fallback chains: [`IdentifierField::CHAIN`] and
//! [`TimestampField::CHAIN`]. Nothing here fails; malformed input resolves
//! to an empty identifier or a missing timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Epoch values below this are read as seconds, otherwise milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// One JSON field value, as the connector happened to send it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    /// Only reached above `i64::MAX`.
    UInteger(u64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl Scalar {
    /// Text form used for identifiers and names.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::UInteger(u) => u.to_string(),
            Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Other(v) => v.to_string(),
        }
    }

    pub fn to_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Scalar::Integer(i) => from_epoch(*i),
            Scalar::UInteger(_) => None,
            Scalar::Float(f) if f.is_finite() => from_epoch(f.trunc() as i64),
            Scalar::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierField {
    Userid,
    UserIdCamel,
    UserIdSnake,
    Uid,
    Id,
    Cardno,
}

impl IdentifierField {
    pub const CHAIN: [IdentifierField; 6] = [
        IdentifierField::Userid,
        IdentifierField::UserIdCamel,
        IdentifierField::UserIdSnake,
        IdentifierField::Uid,
        IdentifierField::Id,
        IdentifierField::Cardno,
    ];

    pub fn key(self) -> &'static str {
        match self {
            IdentifierField::Userid => "userid",
            IdentifierField::UserIdCamel => "userId",
            IdentifierField::UserIdSnake => "user_id",
            IdentifierField::Uid => "uid",
            IdentifierField::Id => "id",
            IdentifierField::Cardno => "cardno",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    Timestamp,
    Time,
    Datetime,
    DateTimeCamel,
    Date,
    LogTime,
}

impl TimestampField {
    pub const CHAIN: [TimestampField; 6] = [
        TimestampField::Timestamp,
        TimestampField::Time,
        TimestampField::Datetime,
        TimestampField::DateTimeCamel,
        TimestampField::Date,
        TimestampField::LogTime,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TimestampField::Timestamp => "timestamp",
            TimestampField::Time => "time",
            TimestampField::Datetime => "datetime",
            TimestampField::DateTimeCamel => "dateTime",
            TimestampField::Date => "date",
            TimestampField::LogTime => "logTime",
        }
    }
}

/// A user or punch record from the connector, reduced to the fields the
/// sync flows read. Unknown fields are dropped; `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpstreamRecord {
    userid: Option<Scalar>,
    #[serde(rename = "userId")]
    user_id_camel: Option<Scalar>,
    user_id: Option<Scalar>,
    uid: Option<Scalar>,
    id: Option<Scalar>,
    cardno: Option<Scalar>,

    name: Option<Scalar>,

    timestamp: Option<Scalar>,
    time: Option<Scalar>,
    datetime: Option<Scalar>,
    #[serde(rename = "dateTime")]
    date_time_camel: Option<Scalar>,
    date: Option<Scalar>,
    #[serde(rename = "logTime")]
    log_time: Option<Scalar>,
}

impl UpstreamRecord {
    /// Anything that is not a JSON object decodes to an empty record.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    fn identifier_slot(&self, field: IdentifierField) -> Option<&Scalar> {
        match field {
            IdentifierField::Userid => self.userid.as_ref(),
            IdentifierField::UserIdCamel => self.user_id_camel.as_ref(),
            IdentifierField::UserIdSnake => self.user_id.as_ref(),
            IdentifierField::Uid => self.uid.as_ref(),
            IdentifierField::Id => self.id.as_ref(),
            IdentifierField::Cardno => self.cardno.as_ref(),
        }
    }

    fn timestamp_slot(&self, field: TimestampField) -> Option<&Scalar> {
        match field {
            TimestampField::Timestamp => self.timestamp.as_ref(),
            TimestampField::Time => self.time.as_ref(),
            TimestampField::Datetime => self.datetime.as_ref(),
            TimestampField::DateTimeCamel => self.date_time_camel.as_ref(),
            TimestampField::Date => self.date.as_ref(),
            TimestampField::LogTime => self.log_time.as_ref(),
        }
    }

    /// Trimmed text of the first identifier field present. Empty means the
    /// record carries no usable identifier.
    pub fn identifier(&self) -> String {
        IdentifierField::CHAIN
            .iter()
            .find_map(|f| self.identifier_slot(*f))
            .map(|v| v.to_text().trim().to_string())
            .unwrap_or_default()
    }

    /// Only the first timestamp field present is parsed; a bad value there
    /// is not rescued by later fields.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        TimestampField::CHAIN
            .iter()
            .find_map(|f| self.timestamp_slot(*f))
            .and_then(Scalar::to_timestamp)
    }

    pub fn name(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|v| v.to_text().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Offset-aware values are converted to UTC; naive ones are taken as the
/// device's wall clock.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn from_epoch(value: i64) -> Option<NaiveDateTime> {
    let parsed = if value.abs() < EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_opt(value, 0).single()
    } else {
        Utc.timestamp_millis_opt(value).single()
    };
    parsed.map(|dt| dt.naive_utc())
}
