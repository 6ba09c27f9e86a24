// src/db/mod.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};

/// Build the Postgres pool. Hosted deployments set DATABASE_URL; local dev
/// falls back to the PG* variables with the dev database defaults.
pub async fn connect() -> anyhow::Result<Pool<Postgres>> {
    let options = match env::var("DATABASE_URL") {
        Ok(url) => PgConnectOptions::from_str(&url)?,
        Err(_) => PgConnectOptions::new()
            .host(&env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string()))
            .port(
                env::var("PGPORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5432),
            )
            .database(&env::var("PGDATABASE").unwrap_or_else(|_| "outdoor_analytics_dev".to_string()))
            .username(&env::var("PGUSER").unwrap_or_else(|_| "postgres".to_string()))
            .password(&env::var("PGPASSWORD").unwrap_or_else(|_| "postgres".to_string())),
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(20))
        .idle_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    println!("✅ Connected to PostgreSQL");
    Ok(pool)
}
