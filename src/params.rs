// src/params.rs

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Map};

use crate::error::ApiError;

/// Raw dashboard query params as they arrive on the wire. Every handler
/// validates these itself, so the aggregation gateway can hand the same raw
/// set to all five parts and let each one reject independently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeParams {
    pub site_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub granularity: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }
}

/// Validated `(site_id, date_from, date_to)` triple.
#[derive(Debug, Clone, Copy)]
pub struct RangeQuery {
    pub site_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

fn parse_site_id(raw: Option<&str>) -> Result<i64, String> {
    match raw.unwrap_or("").trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err("site_id must be a positive integer".to_string()),
    }
}

/// Fixed-width `YYYY-MM-DD` that is also a real calendar date.
fn parse_date(raw: Option<&str>, field: &str) -> Result<NaiveDate, String> {
    let s = raw.unwrap_or("");
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(format!("{field} must match YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("{field} is not a valid date"))
}

/// Validate the shared range params. Field-level failures come back as one
/// 400 with zod-flatten style `details.field_errors`; an inverted range is
/// its own 400 and is checked only once all three fields are well-formed.
pub fn parse_range(raw: &RangeParams) -> Result<RangeQuery, ApiError> {
    let site_id = parse_site_id(raw.site_id.as_deref());
    let date_from = parse_date(raw.date_from.as_deref(), "date_from");
    let date_to = parse_date(raw.date_to.as_deref(), "date_to");

    match (site_id, date_from, date_to) {
        (Ok(site_id), Ok(date_from), Ok(date_to)) => {
            if date_from > date_to {
                return Err(ApiError::validation("date_from must be <= date_to"));
            }
            Ok(RangeQuery {
                site_id,
                date_from,
                date_to,
            })
        }
        (site_id, date_from, date_to) => {
            let mut field_errors = Map::new();
            if let Err(msg) = site_id {
                field_errors.insert("site_id".to_string(), json!([msg]));
            }
            if let Err(msg) = date_from {
                field_errors.insert("date_from".to_string(), json!([msg]));
            }
            if let Err(msg) = date_to {
                field_errors.insert("date_to".to_string(), json!([msg]));
            }
            Err(ApiError::validation_with(
                "Invalid query",
                json!({ "field_errors": field_errors }),
            ))
        }
    }
}

/// Granularity defaults to daily; only traffic and overview consult it.
pub fn parse_granularity(raw: &RangeParams) -> Result<Granularity, ApiError> {
    match raw.granularity.as_deref() {
        None | Some("daily") => Ok(Granularity::Daily),
        Some("hourly") => Ok(Granularity::Hourly),
        Some(_) => Err(ApiError::validation_with(
            "Invalid query",
            json!({ "field_errors": { "granularity": ["granularity must be daily or hourly"] } }),
        )),
    }
}
