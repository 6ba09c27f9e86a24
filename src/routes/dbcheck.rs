// src/routes/dbcheck.rs
//
// Operational diagnostic: connectivity, table inventory and a summary of
// the two traffic tables. Each table block is guarded so a missing table
// reports itself instead of failing the whole check.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::{query_as, query_scalar};

use crate::{
    error::ApiError,
    models::{DailyRangeBySite, HourlyRangeBySite},
    AppState,
};

async fn traffic_daily_summary(state: &AppState) -> Value {
    // Uses the autodetected column names so the summary works on either of
    // the deployed traffic_daily layouts.
    let columns = match state.traffic_schema.get_or_detect(&state.pool).await {
        Ok(columns) => columns,
        Err(err) => {
            return json!({ "exists": false, "error": err.to_string() });
        }
    };

    let count: i64 = match query_scalar("SELECT COUNT(*)::bigint FROM traffic_daily")
        .fetch_one(&state.pool)
        .await
    {
        Ok(count) => count,
        Err(err) => return json!({ "exists": false, "error": err.to_string() }),
    };

    let range_sql = format!(
        r#"
        SELECT site_id::bigint AS site_id,
               MIN({date})::date AS min_date,
               MAX({date})::date AS max_date,
               COUNT(*)::bigint AS rows
        FROM traffic_daily
        GROUP BY site_id
        ORDER BY site_id
        "#,
        date = columns.date_col,
    );
    match query_as::<_, DailyRangeBySite>(&range_sql)
        .fetch_all(&state.pool)
        .await
    {
        Ok(ranges) => json!({ "exists": true, "count": count, "range_by_site": ranges }),
        Err(err) => json!({ "exists": false, "error": err.to_string() }),
    }
}

async fn traffic_hourly_summary(state: &AppState) -> Value {
    let count: i64 = match query_scalar("SELECT COUNT(*)::bigint FROM traffic_hourly")
        .fetch_one(&state.pool)
        .await
    {
        Ok(count) => count,
        Err(err) => return json!({ "exists": false, "error": err.to_string() }),
    };

    match query_as::<_, HourlyRangeBySite>(
        r#"
        SELECT site_id::bigint AS site_id,
               MIN(ts_hour) AS min_ts,
               MAX(ts_hour) AS max_ts,
               COUNT(*)::bigint AS rows
        FROM traffic_hourly
        GROUP BY site_id
        ORDER BY site_id
        "#,
    )
    .fetch_all(&state.pool)
    .await
    {
        Ok(ranges) => json!({ "exists": true, "count": count, "range_by_site": ranges }),
        Err(err) => json!({ "exists": false, "error": err.to_string() }),
    }
}

pub async fn db_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db_time: DateTime<Utc> = query_scalar("SELECT NOW()")
        .fetch_one(&state.pool)
        .await?;

    let tables: Vec<String> = query_scalar(
        r#"
        SELECT tablename
        FROM pg_tables
        WHERE schemaname = 'public'
        ORDER BY tablename
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let traffic_daily = traffic_daily_summary(&state).await;
    let traffic_hourly = traffic_hourly_summary(&state).await;

    Ok(Json(json!({
        "ok": true,
        "db_time": db_time,
        "tables": tables,
        "traffic_daily": traffic_daily,
        "traffic_hourly": traffic_hourly,
    })))
}
