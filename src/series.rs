// src/series.rs
//
// Series normalizer: stored-JSON -> chart series, daily gap-filling and the
// small label helpers the handlers share.

use chrono::{Datelike, NaiveDate};
use serde_json::{Number, Value};
use std::collections::HashMap;

use crate::models::{ChartSlice, SeriesPoint};

/// Hard cap on gap-filled daily series (one leap year).
pub const MAX_DAILY_POINTS: usize = 366;

fn coerce_number(value: Option<&Value>) -> Option<Number> {
    match value {
        // Absent value counts as 0, matching the stored-array shape where
        // only the label is guaranteed.
        None | Some(Value::Null) => Some(Number::from(0)),
        Some(Value::Number(n)) => Some(n.clone()),
        Some(Value::String(s)) => {
            if let Ok(n) = s.trim().parse::<i64>() {
                Some(Number::from(n))
            } else {
                s.trim().parse::<f64>().ok().and_then(Number::from_f64)
            }
        }
        Some(_) => None,
    }
}

fn coerce_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize heterogeneous stored JSON into `[{label, value}]`.
///
/// Supports the two shapes seen in the demography tables:
/// - object map `{"male": 55, "female": 45}` (key order preserved)
/// - array `[{"label": "18-24", "value": 20}, ...]` (also `name`/`key` and
///   `count`/`v` spellings)
///
/// Entries with an empty label or a non-numeric value are dropped.
pub fn json_to_series(input: Option<&Value>) -> Vec<ChartSlice> {
    match input {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let label = coerce_label(
                    item.get("label").or_else(|| item.get("name")).or_else(|| item.get("key")),
                );
                let value = coerce_number(
                    item.get("value").or_else(|| item.get("count")).or_else(|| item.get("v")),
                )?;
                if label.is_empty() {
                    return None;
                }
                Some(ChartSlice { label, value })
            })
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(label, value)| {
                if label.is_empty() {
                    return None;
                }
                Some(ChartSlice {
                    label: label.clone(),
                    value: coerce_number(Some(value))?,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Gap-fill a sparse daily series so every calendar day in
/// `[date_from, date_to]` appears exactly once, missing days at 0,
/// capped at [`MAX_DAILY_POINTS`].
pub fn fill_daily_series(
    date_from: NaiveDate,
    date_to: NaiveDate,
    rows: &[SeriesPoint],
) -> Vec<SeriesPoint> {
    let by_day: HashMap<&str, i64> = rows.iter().map(|p| (p.x.as_str(), p.value)).collect();
    let mut out = Vec::new();
    let mut day = date_from;
    while day <= date_to && out.len() < MAX_DAILY_POINTS {
        let x = day.format("%Y-%m-%d").to_string();
        let value = by_day.get(x.as_str()).copied().unwrap_or(0);
        out.push(SeriesPoint { x, value });
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    out
}

/// `YYYY-MM` labels for every month touched by `[min, max]`.
pub fn month_labels(min: NaiveDate, max: NaiveDate) -> Vec<String> {
    let mut out = Vec::new();
    let (mut year, mut month) = (min.year(), min.month());
    while (year, month) <= (max.year(), max.month()) {
        out.push(format!("{year:04}-{month:02}"));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    out
}

/// Rounded mean of the series values, 0 for an empty series.
pub fn average_value(series: &[SeriesPoint]) -> i64 {
    if series.is_empty() {
        return 0;
    }
    let sum: i64 = series.iter().map(|p| p.value).sum();
    (sum as f64 / series.len() as f64).round() as i64
}

/// Label of the first maximum point; `None` when the series is empty or
/// entirely zero.
pub fn max_point_label(series: &[SeriesPoint]) -> Option<String> {
    let mut best: Option<&SeriesPoint> = None;
    for point in series {
        if point.value > 0 && best.map_or(true, |b| point.value > b.value) {
            best = Some(point);
        }
    }
    best.map(|p| p.x.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn object_map_preserves_key_order() {
        let input = json!({ "male": 55, "female": 45 });
        let series = json_to_series(Some(&input));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "male");
        assert_eq!(series[0].value, Number::from(55));
        assert_eq!(series[1].label, "female");
        assert_eq!(series[1].value, Number::from(45));
    }

    #[test]
    fn array_shape_passes_through() {
        let input = json!([{ "label": "18-24", "value": 20 }]);
        let series = json_to_series(Some(&input));
        assert_eq!(
            series,
            vec![ChartSlice { label: "18-24".into(), value: Number::from(20) }]
        );
    }

    #[test]
    fn array_accepts_alternate_spellings() {
        let input = json!([{ "name": "car", "count": 7 }, { "key": "bus", "v": "3" }]);
        let series = json_to_series(Some(&input));
        assert_eq!(series[0].label, "car");
        assert_eq!(series[0].value, Number::from(7));
        assert_eq!(series[1].label, "bus");
        assert_eq!(series[1].value, Number::from(3));
    }

    #[test]
    fn drops_empty_labels_and_non_numeric_values() {
        let input = json!([
            { "label": "", "value": 10 },
            { "label": "ok", "value": "not a number" },
            { "label": "kept" }
        ]);
        let series = json_to_series(Some(&input));
        assert_eq!(
            series,
            vec![ChartSlice { label: "kept".into(), value: Number::from(0) }]
        );
    }

    #[test]
    fn scalar_or_missing_input_yields_empty_series() {
        assert!(json_to_series(None).is_empty());
        assert!(json_to_series(Some(&json!("oops"))).is_empty());
        assert!(json_to_series(Some(&json!(42))).is_empty());
    }

    #[test]
    fn gap_fill_covers_every_day_inclusive() {
        let rows = vec![
            SeriesPoint { x: "2025-12-02".into(), value: 40 },
            SeriesPoint { x: "2025-12-04".into(), value: 10 },
        ];
        let series = fill_daily_series(date("2025-12-01"), date("2025-12-05"), &rows);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], SeriesPoint { x: "2025-12-01".into(), value: 0 });
        assert_eq!(series[1].value, 40);
        assert_eq!(series[2].value, 0);
        assert_eq!(series[3].value, 10);
        assert_eq!(series[4].value, 0);
    }

    #[test]
    fn gap_fill_caps_at_366_points() {
        let series = fill_daily_series(date("2020-01-01"), date("2025-01-01"), &[]);
        assert_eq!(series.len(), MAX_DAILY_POINTS);
        assert_eq!(series[0].x, "2020-01-01");
        assert_eq!(series[365].x, "2020-12-31");
    }

    #[test]
    fn single_day_range_has_one_point() {
        let series = fill_daily_series(date("2025-12-01"), date("2025-12-01"), &[]);
        assert_eq!(series, vec![SeriesPoint { x: "2025-12-01".into(), value: 0 }]);
    }

    #[test]
    fn month_labels_span_year_boundary() {
        let labels = month_labels(date("2025-11-15"), date("2026-02-01"));
        assert_eq!(labels, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[test]
    fn average_rounds_to_nearest() {
        let series = vec![
            SeriesPoint { x: "a".into(), value: 1 },
            SeriesPoint { x: "b".into(), value: 2 },
        ];
        assert_eq!(average_value(&series), 2);
        assert_eq!(average_value(&[]), 0);
    }

    #[test]
    fn max_point_label_skips_all_zero_series() {
        let zero = vec![SeriesPoint { x: "a".into(), value: 0 }];
        assert_eq!(max_point_label(&zero), None);
        let series = vec![
            SeriesPoint { x: "a".into(), value: 5 },
            SeriesPoint { x: "b".into(), value: 9 },
            SeriesPoint { x: "c".into(), value: 9 },
        ];
        assert_eq!(max_point_label(&series), Some("b".into()));
    }
}
