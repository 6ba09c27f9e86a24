// src/schema.rs
//
// Column autodetection for traffic_daily. Deployments disagree on its
// column names (date column `d` vs `date`, volume column `volume` vs
// `count`), so the KPI path probes information_schema once and caches the
// result for the life of the process.

use std::sync::Arc;

use sqlx::{Pool, Postgres};
use tokio::sync::RwLock;

use crate::error::ApiError;

const DATE_CANDIDATES: [&str; 3] = ["d", "date", "day"];
const VOLUME_CANDIDATES: [&str; 4] = ["volume", "traffic", "count", "value"];

/// Detected column names. Candidates are static identifiers, never client
/// input, so interpolating them into SQL is safe.
#[derive(Debug, Clone, Copy)]
pub struct TrafficDailyColumns {
    pub date_col: &'static str,
    pub volume_col: &'static str,
}

/// Pick the first known candidate out of a table's actual column set.
pub fn pick_columns(available: &[String]) -> Result<TrafficDailyColumns, ApiError> {
    let date_col = DATE_CANDIDATES
        .iter()
        .copied()
        .find(|c| available.iter().any(|a| a == c));
    let volume_col = VOLUME_CANDIDATES
        .iter()
        .copied()
        .find(|c| available.iter().any(|a| a == c));

    match (date_col, volume_col) {
        (Some(date_col), Some(volume_col)) => Ok(TrafficDailyColumns { date_col, volume_col }),
        _ => {
            let listing = if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            };
            let missing = match (date_col, volume_col) {
                (None, None) => "date and volume columns",
                (None, _) => "a date column",
                _ => "a volume column",
            };
            Err(ApiError::SchemaMismatch(format!(
                "traffic_daily is missing {missing}; available columns: {listing}"
            )))
        }
    }
}

/// Process-wide cache of the detection result, injected through `AppState`
/// rather than held in a static, with an explicit reset hook.
#[derive(Clone, Default)]
pub struct TrafficSchemaCache {
    inner: Arc<RwLock<Option<TrafficDailyColumns>>>,
}

impl TrafficSchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_detect(
        &self,
        pool: &Pool<Postgres>,
    ) -> Result<TrafficDailyColumns, ApiError> {
        if let Some(columns) = *self.inner.read().await {
            return Ok(columns);
        }
        let available: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT column_name
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = 'traffic_daily'
            ORDER BY ordinal_position
            "#,
        )
        .fetch_all(pool)
        .await?;

        let columns = pick_columns(&available)?;
        *self.inner.write().await = Some(columns);
        Ok(columns)
    }

    /// Forget the detection result (e.g. after a migration) so the next
    /// request re-probes information_schema.
    pub async fn reset(&self) {
        *self.inner.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_controller_era_names() {
        let c = pick_columns(&cols(&["site_id", "d", "volume"])).unwrap();
        assert_eq!(c.date_col, "d");
        assert_eq!(c.volume_col, "volume");
    }

    #[test]
    fn detects_migrated_names() {
        let c = pick_columns(&cols(&["site_id", "date", "count"])).unwrap();
        assert_eq!(c.date_col, "date");
        assert_eq!(c.volume_col, "count");
    }

    #[test]
    fn prefers_candidates_in_declared_order() {
        let c = pick_columns(&cols(&["date", "d", "count", "volume"])).unwrap();
        assert_eq!(c.date_col, "d");
        assert_eq!(c.volume_col, "volume");
    }

    #[test]
    fn mismatch_enumerates_available_columns() {
        let err = pick_columns(&cols(&["site_id", "total"])).unwrap_err();
        let message = err.body()["message"].as_str().unwrap().to_string();
        assert!(message.contains("site_id, total"), "{message}");
        assert_eq!(err.status().as_u16(), 500);
    }

    #[test]
    fn missing_table_reports_no_columns() {
        let err = pick_columns(&[]).unwrap_err();
        let message = err.body()["message"].as_str().unwrap().to_string();
        assert!(message.contains("(none)"), "{message}");
    }
}
