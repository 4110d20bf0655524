use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::commands::disease::DISEASE_TABLE;
use crate::error::{AgriError, AgriResult};

pub type DbPool = Pool<Sqlite>;

pub async fn init_pool_with_options(opts: SqliteConnectOptions) -> AgriResult<DbPool> {
    Ok(SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(120))
        .connect_with(opts)
        .await?)
}

pub async fn init_pool(database_url: &str) -> AgriResult<DbPool> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AgriError::Internal(format!("Invalid DB URL: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    // SQLite creates the file but not the directory holding it.
    if let Some(parent) = opts.get_filename().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    init_pool_with_options(opts).await
}

/// Single-connection in-memory pool; every connection to `:memory:` would
/// otherwise see its own empty database.
#[cfg(test)]
pub async fn init_memory_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    init_database(&pool)
        .await
        .expect("Failed to initialize in-memory database");
    pool
}

/// Creates the tables if they are missing and seeds reference data.
/// Safe to run on every startup.
pub async fn init_database(pool: &DbPool) -> AgriResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    ensure_seeds(pool).await?;
    tracing::info!("Database ready");
    Ok(())
}

const MARKET_SEED: [(&str, f64, &str, &str); 3] = [
    ("Tomato", 2500.0, "Local Mandi", "up"),
    ("Potato", 1200.0, "City Market", "down"),
    ("Onion", 1800.0, "Wholesale", "up"),
];

// Each table is checked on its own so a partially seeded store gets completed.
async fn ensure_seeds(pool: &DbPool) -> AgriResult<()> {
    let market_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM market_prices")
        .fetch_one(pool)
        .await?;
    if market_count.0 == 0 {
        let mut tx = pool.begin().await?;
        for (crop, price, market, trend) in MARKET_SEED {
            sqlx::query("INSERT INTO market_prices (crop, price, market, trend) VALUES (?, ?, ?, ?)")
                .bind(crop)
                .bind(price)
                .bind(market)
                .bind(trend)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!("Seeded {} market listings", MARKET_SEED.len());
    }

    let disease_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM disease_data")
        .fetch_one(pool)
        .await?;
    if disease_count.0 == 0 {
        let mut tx = pool.begin().await?;
        for entry in DISEASE_TABLE.iter() {
            sqlx::query("INSERT INTO disease_data (disease, treatment, description) VALUES (?, ?, ?)")
                .bind(entry.disease)
                .bind(entry.treatment)
                .bind(entry.description)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!("Seeded {} disease references", DISEASE_TABLE.len());
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub phone: String,
    pub name: String,
    // bcrypt hash; never leaves the server
    #[serde(skip)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MarketListing {
    pub id: i64,
    pub crop: String,
    pub price: f64,
    pub atlanta_retail: Option<f64>,
    pub chicago_retail: Option<f64>,
    pub la_retail: Option<f64>,
    pub new_york_retail: Option<f64>,
    pub average_spread: Option<String>,
    pub market: String,
    pub trend: Option<String>,
    pub phone: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct DiseaseReference {
    pub id: i64,
    pub disease: String,
    pub treatment: String,
    pub description: Option<String>,
}

// Audit rows are write-only for the service; only tests read them back.
#[cfg(test)]
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SoilTestRecord {
    pub id: i64,
    pub user_phone: Option<String>,
    pub n_val: Option<f64>,
    pub p_val: Option<f64>,
    pub k_val: Option<f64>,
    pub ph_val: Option<f64>,
    pub recommendation: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}
