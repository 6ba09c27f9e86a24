// src/routes/traffic.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query_as, Pool, Postgres};

use crate::{
    error::ApiError,
    models::{SeriesPoint, TrafficSummary},
    params::{parse_granularity, parse_range, Granularity, RangeParams},
    series, AppState,
};

#[derive(Debug, Serialize)]
pub struct TrafficMeta {
    pub site_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub granularity: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TrafficResponse {
    pub meta: TrafficMeta,
    pub summary: TrafficSummary,
    pub series: Vec<SeriesPoint>,
}

/// Fetch the series for one site and range. Daily series are gap-filled so
/// every calendar day appears; hourly series carry only the stored hours.
pub(crate) async fn traffic_series(
    pool: &Pool<Postgres>,
    site_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<SeriesPoint>, ApiError> {
    match granularity {
        Granularity::Daily => {
            let rows = query_as::<_, SeriesPoint>(
                r#"
                SELECT to_char(d, 'YYYY-MM-DD') AS x, volume::bigint AS value
                FROM traffic_daily
                WHERE site_id = $1 AND d BETWEEN $2 AND $3
                ORDER BY d ASC
                "#,
            )
            .bind(site_id)
            .bind(date_from)
            .bind(date_to)
            .fetch_all(pool)
            .await?;
            Ok(series::fill_daily_series(date_from, date_to, &rows))
        }
        Granularity::Hourly => {
            let rows = query_as::<_, SeriesPoint>(
                r#"
                SELECT to_char(ts_hour, 'YYYY-MM-DD HH24:00') AS x, volume::bigint AS value
                FROM traffic_hourly
                WHERE site_id = $1
                  AND ts_hour >= $2::date
                  AND ts_hour < ($3::date + INTERVAL '1 day')
                ORDER BY ts_hour ASC
                "#,
            )
            .bind(site_id)
            .bind(date_from)
            .bind(date_to)
            .fetch_all(pool)
            .await?;
            Ok(rows)
        }
    }
}

pub(crate) fn summarize(granularity: Granularity, points: &[SeriesPoint]) -> TrafficSummary {
    let max_label = series::max_point_label(points);
    let (peak_hour, best_day) = match granularity {
        Granularity::Daily => (None, max_label),
        Granularity::Hourly => (max_label, None),
    };
    TrafficSummary {
        peak_hour,
        best_day,
        avg_daily_traffic: series::average_value(points),
    }
}

pub(crate) async fn traffic_data(
    state: &AppState,
    raw: &RangeParams,
) -> Result<TrafficResponse, ApiError> {
    let q = parse_range(raw)?;
    let granularity = parse_granularity(raw)?;

    let points =
        traffic_series(&state.pool, q.site_id, q.date_from, q.date_to, granularity).await?;

    Ok(TrafficResponse {
        meta: TrafficMeta {
            site_id: q.site_id,
            date_from: q.date_from,
            date_to: q.date_to,
            granularity: granularity.as_str(),
        },
        summary: summarize(granularity, &points),
        series: points,
    })
}

pub async fn get_traffic(
    State(state): State<AppState>,
    Query(raw): Query<RangeParams>,
) -> Result<Json<TrafficResponse>, ApiError> {
    Ok(Json(traffic_data(&state, &raw).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: &str, value: i64) -> SeriesPoint {
        SeriesPoint { x: x.into(), value }
    }

    #[test]
    fn daily_summary_reports_best_day() {
        let points = vec![point("2025-12-01", 10), point("2025-12-02", 30)];
        let summary = summarize(Granularity::Daily, &points);
        assert_eq!(summary.best_day.as_deref(), Some("2025-12-02"));
        assert_eq!(summary.peak_hour, None);
        assert_eq!(summary.avg_daily_traffic, 20);
    }

    #[test]
    fn hourly_summary_reports_peak_hour() {
        let points = vec![point("2025-12-01 07:00", 120), point("2025-12-01 08:00", 90)];
        let summary = summarize(Granularity::Hourly, &points);
        assert_eq!(summary.peak_hour.as_deref(), Some("2025-12-01 07:00"));
        assert_eq!(summary.best_day, None);
    }

    #[test]
    fn empty_series_has_zero_average_and_no_labels() {
        let summary = summarize(Granularity::Daily, &[]);
        assert_eq!(summary.avg_daily_traffic, 0);
        assert_eq!(summary.best_day, None);
        assert_eq!(summary.peak_hour, None);
    }
}
