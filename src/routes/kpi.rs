// src/routes/kpi.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query_as, query_scalar, Pool, Postgres};

use crate::{
    error::ApiError,
    models::{Kpis, ScoreAggRow},
    params::{parse_range, RangeParams},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct KpiResponse {
    pub site_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub kpis: Kpis,
}

fn round_score(avg: Option<f64>) -> i64 {
    avg.unwrap_or(0.0).round() as i64
}

/// Score block shared with /overview: range averages of the four quality
/// scores plus the impression sum, total = mean of the rounded scores.
pub(crate) async fn score_kpis(
    pool: &Pool<Postgres>,
    site_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Kpis, ApiError> {
    let agg = query_as::<_, ScoreAggRow>(
        r#"
        SELECT
          AVG(poi_score)::float8         AS poi_score_avg,
          AVG(technical_score)::float8   AS technical_score_avg,
          AVG(traffic_score)::float8     AS traffic_score_avg,
          AVG(demographic_score)::float8 AS demographic_score_avg,
          COALESCE(SUM(impressions), 0)::bigint AS impressions_sum
        FROM site_scores_daily
        WHERE site_id = $1 AND d BETWEEN $2 AND $3
        "#,
    )
    .bind(site_id)
    .bind(date_from)
    .bind(date_to)
    .fetch_one(pool)
    .await?;

    let poi = round_score(agg.poi_score_avg);
    let technical = round_score(agg.technical_score_avg);
    let traffic = round_score(agg.traffic_score_avg);
    let demographic = round_score(agg.demographic_score_avg);
    let total = ((poi + technical + traffic + demographic) as f64 / 4.0).round() as i64;

    Ok(Kpis {
        poi_score: poi,
        technical_score: technical,
        traffic_score: traffic,
        demographic_score: demographic,
        monthly_impression: agg.impressions_sum,
        total_score: total,
    })
}

pub(crate) async fn kpi_data(
    state: &AppState,
    raw: &RangeParams,
) -> Result<KpiResponse, ApiError> {
    let q = parse_range(raw)?;
    let mut kpis = score_kpis(&state.pool, q.site_id, q.date_from, q.date_to).await?;

    // No pre-computed impressions in range: estimate from raw traffic
    // volume. traffic_daily column names drift across deployments, so the
    // query is built from the autodetected (and cached) column set.
    if kpis.monthly_impression == 0 {
        let columns = state.traffic_schema.get_or_detect(&state.pool).await?;
        let sql = format!(
            r#"
            SELECT COALESCE(SUM({volume}), 0)::bigint
            FROM traffic_daily
            WHERE site_id = $1 AND {date} BETWEEN $2 AND $3
            "#,
            volume = columns.volume_col,
            date = columns.date_col,
        );
        kpis.monthly_impression = query_scalar::<_, i64>(&sql)
            .bind(q.site_id)
            .bind(q.date_from)
            .bind(q.date_to)
            .fetch_one(&state.pool)
            .await?;
    }

    Ok(KpiResponse {
        site_id: q.site_id,
        date_from: q.date_from,
        date_to: q.date_to,
        kpis,
    })
}

pub async fn get_kpi(
    State(state): State<AppState>,
    Query(raw): Query<RangeParams>,
) -> Result<Json<KpiResponse>, ApiError> {
    Ok(Json(kpi_data(&state, &raw).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_round_to_nearest_integer() {
        assert_eq!(round_score(Some(72.4)), 72);
        assert_eq!(round_score(Some(72.5)), 73);
        assert_eq!(round_score(None), 0);
    }
}
