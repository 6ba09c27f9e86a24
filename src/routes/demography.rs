// src/routes/demography.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query_as, Pool, Postgres};

use crate::{
    error::ApiError,
    models::{Chart, DemographyCharts, DemographyRow},
    params::{parse_range, RangeParams},
    series::json_to_series,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct DemographyMeta {
    pub site_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DemographyResponse {
    pub meta: DemographyMeta,
    pub charts: DemographyCharts,
}

/// Latest snapshot in range (not an aggregate), normalized into the four
/// chart series. A site with no rows in range yields empty series, not 404.
pub(crate) async fn demography_charts(
    pool: &Pool<Postgres>,
    site_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<DemographyCharts, ApiError> {
    let row = query_as::<_, DemographyRow>(
        r#"
        SELECT audience_gender, audience_mobile, place_category, interest_segment
        FROM site_demography_daily
        WHERE site_id = $1 AND d BETWEEN $2 AND $3
        ORDER BY d DESC
        LIMIT 1
        "#,
    )
    .bind(site_id)
    .bind(date_from)
    .bind(date_to)
    .fetch_optional(pool)
    .await?
    .unwrap_or_default();

    Ok(DemographyCharts {
        audience_mobile: Chart::donut(json_to_series(row.audience_mobile.as_ref())),
        audience_gender: Chart::donut(json_to_series(row.audience_gender.as_ref())),
        place_category: Chart::bar_horizontal(json_to_series(row.place_category.as_ref())),
        interest_segmentation: Chart::donut(json_to_series(row.interest_segment.as_ref())),
    })
}

pub(crate) async fn demography_data(
    state: &AppState,
    raw: &RangeParams,
) -> Result<DemographyResponse, ApiError> {
    let q = parse_range(raw)?;
    let charts = demography_charts(&state.pool, q.site_id, q.date_from, q.date_to).await?;

    Ok(DemographyResponse {
        meta: DemographyMeta {
            site_id: q.site_id,
            date_from: q.date_from,
            date_to: q.date_to,
            version: "demography-v2-array-series",
        },
        charts,
    })
}

pub async fn get_demography(
    State(state): State<AppState>,
    Query(raw): Query<RangeParams>,
) -> Result<Json<DemographyResponse>, ApiError> {
    Ok(Json(demography_data(&state, &raw).await?))
}
