use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/agrivistara.db";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_WEATHER_CITY: &str = "Chennai";
const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MARKET_PRICE_LIMIT: i64 = 100;

/// Process-wide settings, read once from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub crop_dataset_path: PathBuf,
    pub disease_dataset_path: PathBuf,
    pub weather_api_key: Option<String>,
    pub weather_default_city: String,
    pub weather_timeout: Duration,
    /// Cap applied to the market price listing when the caller gives no limit.
    pub market_price_limit: i64,
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            crop_dataset_path: PathBuf::from("data").join("advanced_crop_datasets.json"),
            disease_dataset_path: PathBuf::from("data").join("disease_symptoms_dataset.csv"),
            weather_api_key: None,
            weather_default_city: DEFAULT_WEATHER_CITY.to_string(),
            weather_timeout: Duration::from_secs(DEFAULT_WEATHER_TIMEOUT_SECS),
            market_price_limit: DEFAULT_MARKET_PRICE_LIMIT,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            tracing::warn!(
                "DATABASE_URL not found in env, using default {}",
                DEFAULT_DATABASE_URL
            );
            defaults.database_url.clone()
        });

        let weather_api_key = env::var("WEATHER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if weather_api_key.is_none() {
            tracing::warn!("WEATHER_API_KEY not set, weather endpoint will serve fallback data");
        }

        Self {
            database_url,
            port: parse_var("PORT", defaults.port),
            crop_dataset_path: env::var("CROP_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.crop_dataset_path),
            disease_dataset_path: env::var("DISEASE_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.disease_dataset_path),
            weather_api_key,
            weather_default_city: env::var("WEATHER_DEFAULT_CITY")
                .unwrap_or(defaults.weather_default_city),
            weather_timeout: Duration::from_secs(parse_var(
                "WEATHER_TIMEOUT_SECS",
                DEFAULT_WEATHER_TIMEOUT_SECS,
            )),
            market_price_limit: parse_var("MARKET_PRICE_LIMIT", defaults.market_price_limit),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost).clamp(4, 31),
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("{}={:?} is not valid, using {}", name, raw, default);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("PORT", "8080", 5000u16), 8080);
        assert_eq!(parse_or("PORT", " 8081 ", 5000u16), 8081);
        assert_eq!(parse_or("PORT", "eighty", 5000u16), 5000);
        assert_eq!(parse_or("MARKET_PRICE_LIMIT", "-", 100i64), 100);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.market_price_limit, 100);
        assert_eq!(config.weather_default_city, "Chennai");
        assert!(config.weather_api_key.is_none());
    }
}
