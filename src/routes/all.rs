// src/routes/all.rs
//
// Aggregation gateway: one request fans out to the five metric handlers,
// each of which validates and fails on its own; the envelope always carries
// all five parts, with 207 signalling that at least one degraded.

use std::future::Future;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    params::RangeParams,
    routes::{demography, filters, kpi, overview, traffic},
    AppState,
};

const USAGE_EXAMPLE: &str =
    "/api/dashboard/all?site_id=1&date_from=2025-12-01&date_to=2025-12-31&granularity=daily";

/// Captured outcome of one sub-handler.
#[derive(Debug, Clone)]
pub(crate) struct Part {
    pub status: u16,
    pub body: Value,
}

/// Run one sub-handler to completion and capture its status and body. An
/// error here is absorbed into the part, never propagated, so one failing
/// metric cannot take the other four down with it.
pub(crate) async fn run_part<T, F>(fut: F) -> Part
where
    T: Serialize,
    F: Future<Output = Result<T, ApiError>>,
{
    match fut.await {
        Ok(body) => match serde_json::to_value(body) {
            Ok(body) => Part { status: 200, body },
            Err(err) => {
                tracing::error!("part serialization failed: {err}");
                Part {
                    status: 500,
                    body: json!({ "error": "Internal server error", "message": err.to_string() }),
                }
            }
        },
        Err(err) => {
            if err.status().is_server_error() {
                tracing::error!("part failed: {err}");
            }
            Part {
                status: err.status().as_u16(),
                body: err.body(),
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AllMeta {
    pub site_id: Option<i64>,
    pub date_from: String,
    pub date_to: String,
    pub granularity: String,
    pub version: &'static str,
}

// Key order of the envelope is fixed: filters, kpi, traffic, demography,
// overview.
#[derive(Debug, Serialize)]
pub struct PartStatuses {
    pub filters: u16,
    pub kpi: u16,
    pub traffic: u16,
    pub demography: u16,
    pub overview: u16,
}

#[derive(Debug, Serialize)]
pub struct PartBodies {
    pub filters: Value,
    pub kpi: Value,
    pub traffic: Value,
    pub demography: Value,
    pub overview: Value,
}

#[derive(Debug, Serialize)]
pub struct AllResponse {
    pub meta: AllMeta,
    pub parts_status: PartStatuses,
    pub data: PartBodies,
}

pub(crate) fn missing_required(raw: &RangeParams) -> bool {
    raw.site_id.is_none() || raw.date_from.is_none() || raw.date_to.is_none()
}

/// Any part >= 400 makes the aggregate a 207; the gateway itself never
/// turns a part failure into a 4xx/5xx of its own.
pub(crate) fn aggregate_status(parts: [&Part; 5]) -> StatusCode {
    if parts.iter().any(|p| p.status >= 400) {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    }
}

pub(crate) fn build_envelope(
    raw: &RangeParams,
    filters: Part,
    kpi: Part,
    traffic: Part,
    demography: Part,
    overview: Part,
) -> (StatusCode, AllResponse) {
    let status = aggregate_status([&filters, &kpi, &traffic, &demography, &overview]);

    // Non-numeric site_id still reaches this point (each part rejects it on
    // its own); the meta echoes it as null rather than failing the envelope.
    let site_id = raw
        .site_id
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok());

    let envelope = AllResponse {
        meta: AllMeta {
            site_id,
            date_from: raw.date_from.clone().unwrap_or_default(),
            date_to: raw.date_to.clone().unwrap_or_default(),
            granularity: raw.granularity.clone().unwrap_or_else(|| "daily".to_string()),
            version: "dashboard-all-v1",
        },
        parts_status: PartStatuses {
            filters: filters.status,
            kpi: kpi.status,
            traffic: traffic.status,
            demography: demography.status,
            overview: overview.status,
        },
        data: PartBodies {
            filters: filters.body,
            kpi: kpi.body,
            traffic: traffic.body,
            demography: demography.body,
            overview: overview.body,
        },
    };

    (status, envelope)
}

pub async fn get_all(State(state): State<AppState>, Query(raw): Query<RangeParams>) -> Response {
    // Presence check only; per-field validity is each sub-handler's own
    // responsibility and shows up as a part-level 400.
    if missing_required(&raw) {
        return ApiError::validation_with(
            "Required query params: site_id, date_from, date_to",
            json!({ "example": USAGE_EXAMPLE }),
        )
        .into_response();
    }

    // granularity is forced onto all five even though some ignore it.
    let mut shared = raw.clone();
    if shared.granularity.is_none() {
        shared.granularity = Some("daily".to_string());
    }

    let (filters, kpi, traffic, demography, overview) = tokio::join!(
        run_part(filters::filters_data(&state)),
        run_part(kpi::kpi_data(&state, &shared)),
        run_part(traffic::traffic_data(&state, &shared)),
        run_part(demography::demography_data(&state, &shared)),
        run_part(overview::overview_data(&state, &shared)),
    );

    let (status, envelope) = build_envelope(&shared, filters, kpi, traffic, demography, overview);
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_part() -> Part {
        Part { status: 200, body: json!({ "ok": true }) }
    }

    fn failed_part(status: u16) -> Part {
        Part { status, body: json!({ "error": "Internal server error" }) }
    }

    fn shared_params() -> RangeParams {
        RangeParams {
            site_id: Some("1".into()),
            date_from: Some("2025-12-01".into()),
            date_to: Some("2025-12-31".into()),
            granularity: Some("daily".into()),
        }
    }

    #[test]
    fn all_parts_ok_yields_200() {
        let (status, envelope) = build_envelope(
            &shared_params(),
            ok_part(),
            ok_part(),
            ok_part(),
            ok_part(),
            ok_part(),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.meta.site_id, Some(1));
        assert_eq!(envelope.meta.version, "dashboard-all-v1");
        assert_eq!(envelope.parts_status.overview, 200);
    }

    #[test]
    fn one_failed_part_yields_207_with_others_intact() {
        let (status, envelope) = build_envelope(
            &shared_params(),
            ok_part(),
            failed_part(500),
            ok_part(),
            ok_part(),
            ok_part(),
        );
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(envelope.parts_status.kpi, 500);
        assert_eq!(envelope.parts_status.traffic, 200);
        assert_eq!(envelope.data.traffic["ok"], true);
        assert_eq!(envelope.data.kpi["error"], "Internal server error");
    }

    #[test]
    fn part_level_400_also_yields_207() {
        let (status, _) = build_envelope(
            &shared_params(),
            ok_part(),
            failed_part(400),
            ok_part(),
            ok_part(),
            ok_part(),
        );
        assert_eq!(status, StatusCode::MULTI_STATUS);
    }

    #[test]
    fn non_numeric_site_id_serializes_as_null_meta() {
        let mut params = shared_params();
        params.site_id = Some("abc".into());
        let (_, envelope) = build_envelope(
            &params,
            ok_part(),
            ok_part(),
            ok_part(),
            ok_part(),
            ok_part(),
        );
        assert_eq!(envelope.meta.site_id, None);
        let meta = serde_json::to_value(&envelope.meta).unwrap();
        assert!(meta["site_id"].is_null());
    }

    #[test]
    fn envelope_key_order_is_fixed() {
        let (_, envelope) = build_envelope(
            &shared_params(),
            ok_part(),
            ok_part(),
            ok_part(),
            ok_part(),
            ok_part(),
        );
        let value = serde_json::to_value(&envelope).unwrap();
        let keys: Vec<&String> = value["parts_status"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["filters", "kpi", "traffic", "demography", "overview"]);
    }

    #[test]
    fn missing_required_detects_each_param() {
        let mut params = shared_params();
        assert!(!missing_required(&params));
        params.site_id = None;
        assert!(missing_required(&params));
        let mut params = shared_params();
        params.date_to = None;
        assert!(missing_required(&params));
    }

    #[tokio::test]
    async fn run_part_absorbs_errors_and_runs_all_siblings() {
        let calls = AtomicUsize::new(0);
        let count = |result: Result<Value, ApiError>| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { result }
        };

        let (a, b, c, d, e) = tokio::join!(
            run_part(count(Ok(json!({ "n": 1 })))),
            run_part(count(Err(ApiError::internal("query failed")))),
            run_part(count(Ok(json!({ "n": 3 })))),
            run_part(count(Ok(json!({ "n": 4 })))),
            run_part(count(Ok(json!({ "n": 5 })))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(a.status, 200);
        assert_eq!(b.status, 500);
        assert_eq!(b.body["error"], "Internal server error");
        assert_eq!(b.body["message"], "query failed");
        assert_eq!(c.status, 200);
        assert_eq!(d.status, 200);
        assert_eq!(e.status, 200);
    }
}
