// src/routes/overview.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query_as, Pool, Postgres};

use crate::{
    error::ApiError,
    models::{DemographyCharts, Kpis, Poi, PoiRow, Site, TrafficBlock},
    params::{parse_granularity, parse_range, RangeParams},
    routes::{demography, kpi, traffic},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct OverviewMeta {
    pub site_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub granularity: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct MapBlock {
    pub center: Option<MapCenter>,
    pub pois: Vec<Poi>,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub meta: OverviewMeta,
    pub site: Site,
    pub kpis: Kpis,
    pub poi_within_500m: Option<i64>,
    pub map: MapBlock,
    pub traffic: TrafficBlock,
    pub demography: DemographyCharts,
}

/// Nearest POIs by Haversine distance, in plain SQL so the store needs no
/// PostGIS extension.
async fn nearest_pois(
    pool: &Pool<Postgres>,
    lat: f64,
    lon: f64,
) -> Result<Vec<PoiRow>, sqlx::Error> {
    query_as::<_, PoiRow>(
        r#"
        SELECT
          p.id::bigint AS id,
          p.name,
          p.category,
          p.latitude::float8 AS lat,
          p.longitude::float8 AS lon,
          (6371000 * 2 * asin(
            sqrt(
              pow(sin(radians((p.latitude - $1) / 2)), 2) +
              cos(radians($1)) * cos(radians(p.latitude)) *
              pow(sin(radians((p.longitude - $2) / 2)), 2)
            )
          ))::float8 AS distance_m
        FROM poi_points p
        WHERE p.latitude IS NOT NULL AND p.longitude IS NOT NULL
        ORDER BY distance_m ASC
        LIMIT 50
        "#,
    )
    .bind(lat)
    .bind(lon)
    .fetch_all(pool)
    .await
}

pub(crate) async fn overview_data(
    state: &AppState,
    raw: &RangeParams,
) -> Result<OverviewResponse, ApiError> {
    let q = parse_range(raw)?;
    let granularity = parse_granularity(raw)?;

    let site = query_as::<_, Site>(
        r#"
        SELECT
          id::bigint AS id,
          name,
          city,
          ooh_type,
          latitude::float8 AS latitude,
          longitude::float8 AS longitude
        FROM sites
        WHERE id = $1
        "#,
    )
    .bind(q.site_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    // POI block degrades gracefully: some deployments have no poi_points
    // table, and the dashboard must still render without the map widget.
    let mut map = MapBlock { center: None, pois: Vec::new() };
    let mut poi_within_500m = None;

    if let (Some(lat), Some(lon)) = (site.latitude, site.longitude) {
        map.center = Some(MapCenter { lat, lon });
        match nearest_pois(&state.pool, lat, lon).await {
            Ok(rows) => {
                let pois: Vec<Poi> = rows
                    .into_iter()
                    .map(|r| Poi {
                        id: r.id,
                        name: r.name,
                        category: r.category,
                        lat: r.lat,
                        lon: r.lon,
                        distance_m: r.distance_m.round() as i64,
                    })
                    .collect();
                poi_within_500m = Some(pois.iter().filter(|p| p.distance_m <= 500).count() as i64);
                map.pois = pois;
            }
            Err(err) => {
                tracing::warn!("overview poi query skipped: {err}");
            }
        }
    }

    let kpis = kpi::score_kpis(&state.pool, q.site_id, q.date_from, q.date_to).await?;

    let points =
        traffic::traffic_series(&state.pool, q.site_id, q.date_from, q.date_to, granularity)
            .await?;
    let traffic = TrafficBlock {
        summary: traffic::summarize(granularity, &points),
        series: points,
    };

    let demography =
        demography::demography_charts(&state.pool, q.site_id, q.date_from, q.date_to).await?;

    Ok(OverviewResponse {
        meta: OverviewMeta {
            site_id: q.site_id,
            date_from: q.date_from,
            date_to: q.date_to,
            granularity: granularity.as_str(),
        },
        site,
        kpis,
        poi_within_500m,
        map,
        traffic,
        demography,
    })
}

pub async fn get_overview(
    State(state): State<AppState>,
    Query(raw): Query<RangeParams>,
) -> Result<Json<OverviewResponse>, ApiError> {
    Ok(Json(overview_data(&state, &raw).await?))
}
