// src/routes/filters.rs

use std::collections::BTreeSet;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query_as, FromRow};

use crate::{error::ApiError, models::Site, series, AppState};

#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    pub ok: bool,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub months: Vec<String>,
    pub cities: Vec<String>,
    pub ooh_types: Vec<String>,
    pub sites: Vec<Site>,
}

#[derive(FromRow)]
struct BoundsRow {
    date_min: Option<NaiveDate>,
    date_max: Option<NaiveDate>,
}

fn sorted_unique(values: impl Iterator<Item = Option<String>>) -> Vec<String> {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub(crate) async fn filters_data(state: &AppState) -> Result<FiltersResponse, ApiError> {
    let sites = query_as::<_, Site>(
        r#"
        SELECT
          id::bigint AS id,
          name,
          city,
          ooh_type,
          latitude::float8 AS latitude,
          longitude::float8 AS longitude
        FROM sites
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    // Unique cities / ooh types derived from the site rows themselves,
    // safer than trusting seed data to keep separate lookup tables in sync.
    let cities = sorted_unique(sites.iter().map(|s| s.city.clone()));
    let ooh_types = sorted_unique(sites.iter().map(|s| s.ooh_type.clone()));

    // Date bounds from the union of the daily tables the dashboard reads;
    // if one is empty the other still drives the range.
    let bounds = query_as::<_, BoundsRow>(
        r#"
        SELECT MIN(d)::date AS date_min, MAX(d)::date AS date_max
        FROM (
          SELECT d FROM traffic_daily
          UNION ALL
          SELECT d FROM site_demography_daily
        ) all_days
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let months = match (bounds.date_min, bounds.date_max) {
        (Some(min), Some(max)) => series::month_labels(min, max),
        _ => Vec::new(),
    };

    Ok(FiltersResponse {
        ok: true,
        date_min: bounds.date_min,
        date_max: bounds.date_max,
        months,
        cities,
        ooh_types,
        sites,
    })
}

pub async fn get_filters(State(state): State<AppState>) -> Result<Json<FiltersResponse>, ApiError> {
    Ok(Json(filters_data(&state).await?))
}
