use crate::error::{GexError, GexResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Option right (call or put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl OptionRight {
    /// Lenient decoding: "C" in any case is a call, every other code is a put.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("c") {
            OptionRight::Call
        } else {
            OptionRight::Put
        }
    }

    /// Strict decoding: only C/P (any case) are accepted.
    pub fn parse_strict(code: &str) -> GexResult<Self> {
        match code.trim() {
            c if c.eq_ignore_ascii_case("c") => Ok(OptionRight::Call),
            p if p.eq_ignore_ascii_case("p") => Ok(OptionRight::Put),
            other => Err(GexError::InvalidRight(other.to_string())),
        }
    }

    /// Whether `code` is one of the two recognised codes.
    pub fn is_known_code(code: &str) -> bool {
        Self::parse_strict(code).is_ok()
    }

    pub fn code(&self) -> &'static str {
        match self {
            OptionRight::Call => "C",
            OptionRight::Put => "P",
        }
    }
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One contract record as delivered by a chain provider.
///
/// Everything except strike and right may be missing; defaults are applied
/// when the record is resolved for pricing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContract {
    pub symbol: Option<String>,
    pub underlying: Option<String>,
    pub expiry: Option<String>,
    pub strike: f64,
    pub right: String,
    pub iv: Option<f64>,
    pub oi: Option<u64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub mid: Option<f64>,
    pub last: Option<f64>,
    pub rate: Option<f64>,
    pub dividend: Option<f64>,
    pub multiplier: Option<u32>,
    pub spot: Option<f64>,
}

/// Options chain snapshot for one underlying and one expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub symbol: String,
    pub spot: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expiry: DateTime<Utc>,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub contracts: Vec<RawContract>,
}

impl ChainSnapshot {
    pub fn from_json(json: &str) -> GexResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse the timestamp formats providers hand us.
///
/// Accepts RFC 3339 with an offset, naive ISO date-times (read as UTC) and
/// bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> GexResult<DateTime<Utc>> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(GexError::InvalidTimestamp(raw.to_string()))
}

/// Expiry date from user input ("2024-01-05" or any accepted timestamp).
pub fn parse_expiry_date(raw: &str) -> GexResult<NaiveDate> {
    Ok(parse_timestamp(raw)?.date_naive())
}

/// Standard equity option close: 16:00 UTC on the expiry date.
pub fn expiry_at_close(date: NaiveDate) -> DateTime<Utc> {
    let close = date
        .and_hms_opt(16, 0, 0)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    Utc.from_utc_datetime(&close)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
