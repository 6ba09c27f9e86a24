// src/models/mod.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

// ───────────────────────────────────────
// Dimension tables (read-only)
// ───────────────────────────────────────
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub ooh_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ───────────────────────────────────────
// Time series & chart shapes
// ───────────────────────────────────────

/// One point of a traffic series; `x` is a date or date-hour label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SeriesPoint {
    pub x: String,
    pub value: i64,
}

/// One slice of a demography chart. The value stays a `serde_json::Number`
/// so stored integers are not widened to floats on the way out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: serde_json::Number,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub series: Vec<ChartSlice>,
}

impl Chart {
    pub fn donut(series: Vec<ChartSlice>) -> Self {
        Chart { kind: "donut", series }
    }

    pub fn bar_horizontal(series: Vec<ChartSlice>) -> Self {
        Chart { kind: "bar_horizontal", series }
    }
}

/// The four demography widgets, shared by /demography and /overview.
#[derive(Debug, Clone, Serialize)]
pub struct DemographyCharts {
    pub audience_mobile: Chart,
    pub audience_gender: Chart,
    pub place_category: Chart,
    pub interest_segmentation: Chart,
}

// ───────────────────────────────────────
// KPI & score aggregates
// ───────────────────────────────────────
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub poi_score: i64,
    pub technical_score: i64,
    pub traffic_score: i64,
    pub demographic_score: i64,
    pub monthly_impression: i64,
    pub total_score: i64,
}

/// Aggregate over site_scores_daily; averages cast to float8 in SQL so the
/// NUMERIC driver feature is not needed.
#[derive(Debug, FromRow)]
pub struct ScoreAggRow {
    pub poi_score_avg: Option<f64>,
    pub technical_score_avg: Option<f64>,
    pub traffic_score_avg: Option<f64>,
    pub demographic_score_avg: Option<f64>,
    pub impressions_sum: i64,
}

// ───────────────────────────────────────
// Demography snapshot row (jsonb columns)
// ───────────────────────────────────────
#[derive(Debug, Default, FromRow)]
pub struct DemographyRow {
    pub audience_gender: Option<Value>,
    pub audience_mobile: Option<Value>,
    pub place_category: Option<Value>,
    pub interest_segment: Option<Value>,
}

// ───────────────────────────────────────
// POI proximity
// ───────────────────────────────────────
#[derive(Debug, FromRow)]
pub struct PoiRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Poi {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub distance_m: i64,
}

// ───────────────────────────────────────
// Traffic response blocks (also embedded in /overview)
// ───────────────────────────────────────
#[derive(Debug, Clone, Serialize)]
pub struct TrafficSummary {
    pub peak_hour: Option<String>,
    pub best_day: Option<String>,
    pub avg_daily_traffic: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrafficBlock {
    pub summary: TrafficSummary,
    pub series: Vec<SeriesPoint>,
}

// ───────────────────────────────────────
// Diagnostic rows for /__dbcheck
// ───────────────────────────────────────
#[derive(Debug, Serialize, FromRow)]
pub struct DailyRangeBySite {
    pub site_id: i64,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub rows: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct HourlyRangeBySite {
    pub site_id: i64,
    pub min_ts: Option<NaiveDateTime>,
    pub max_ts: Option<NaiveDateTime>,
    pub rows: i64,
}
