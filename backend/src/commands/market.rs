use crate::db::{DbPool, MarketListing};
use crate::error::{AgriError, AgriResult};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;
use axum::{
    extract::{Json, State},
    http::header,
    response::IntoResponse,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const NEW_LISTING_TREND: &str = "new";
const EXPORT_FILE_NAME: &str = "market_prices_dataset.csv";

/// Newest first. `None` returns every listing.
pub async fn list_market_prices(pool: &DbPool, limit: Option<i64>) -> AgriResult<Vec<MarketListing>> {
    let rows = match limit {
        Some(limit) => {
            sqlx::query_as::<_, MarketListing>("SELECT * FROM market_prices ORDER BY id DESC LIMIT ?")
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, MarketListing>("SELECT * FROM market_prices ORDER BY id DESC")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

pub async fn add_market_listing(
    pool: &DbPool,
    crop: &str,
    price: f64,
    market: &str,
    phone: Option<&str>,
) -> AgriResult<i64> {
    let result = sqlx::query(
        "INSERT INTO market_prices (crop, price, market, trend, phone) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(crop)
    .bind(price)
    .bind(market)
    .bind(NEW_LISTING_TREND)
    .bind(phone)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!("Listed {} at {} in {} (listing {})", crop, price, market, id);
    Ok(id)
}

/// Renders listings as CSV, columns in table order, header included.
pub fn market_listings_to_csv(listings: &[MarketListing]) -> AgriResult<Vec<u8>> {
    let mut df = df!(
        "id" => listings.iter().map(|l| l.id).collect::<Vec<_>>(),
        "crop" => listings.iter().map(|l| l.crop.clone()).collect::<Vec<_>>(),
        "price" => listings.iter().map(|l| l.price).collect::<Vec<_>>(),
        "atlanta_retail" => listings.iter().map(|l| l.atlanta_retail).collect::<Vec<_>>(),
        "chicago_retail" => listings.iter().map(|l| l.chicago_retail).collect::<Vec<_>>(),
        "la_retail" => listings.iter().map(|l| l.la_retail).collect::<Vec<_>>(),
        "new_york_retail" => listings.iter().map(|l| l.new_york_retail).collect::<Vec<_>>(),
        "average_spread" => listings.iter().map(|l| l.average_spread.clone()).collect::<Vec<_>>(),
        "market" => listings.iter().map(|l| l.market.clone()).collect::<Vec<_>>(),
        "trend" => listings.iter().map(|l| l.trend.clone()).collect::<Vec<_>>(),
        "phone" => listings.iter().map(|l| l.phone.clone()).collect::<Vec<_>>(),
        "timestamp" => listings
            .iter()
            .map(|l| l.timestamp.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()))
            .collect::<Vec<_>>(),
    )?;

    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)?;
    Ok(buf)
}

#[derive(Debug, Deserialize)]
pub struct MarketPricesQuery {
    pub limit: Option<i64>,
}

pub async fn get_market_prices_axum(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MarketPricesQuery>,
) -> AgriResult<Json<Vec<MarketListing>>> {
    let limit = query.limit.unwrap_or(state.config.market_price_limit);
    if limit < 0 {
        return Err(AgriError::Validation("limit must not be negative".to_string()));
    }

    let rows = list_market_prices(&state.pool, Some(limit)).await?;
    tracing::debug!("Fetched {} market listings", rows.len());
    Ok(Json(rows))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SellCropRequest {
    pub crop: Option<String>,
    pub price: Option<Value>,
    pub market: Option<String>,
    pub phone: Option<String>,
}

fn parse_price(value: Option<&Value>) -> AgriResult<f64> {
    let price = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    price
        .filter(|p| p.is_finite())
        .ok_or_else(|| AgriError::Validation("price must be a number".to_string()))
}

pub async fn sell_crop_axum(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SellCropRequest>,
) -> AgriResult<Json<Value>> {
    let crop = payload
        .crop
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AgriError::Validation("Missing required field: crop".to_string()))?;
    let market = payload
        .market
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AgriError::Validation("Missing required field: market".to_string()))?;
    let price = parse_price(payload.price.as_ref())?;

    add_market_listing(&state.pool, &crop, price, &market, payload.phone.as_deref()).await?;

    Ok(Json(json!({ "message": "Listed for sale!" })))
}

pub async fn download_market_data_axum(State(state): State<AppState>) -> AgriResult<impl IntoResponse> {
    let rows = list_market_prices(&state.pool, None).await?;
    let csv = market_listings_to_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    #[tokio::test]
    async fn test_seeded_listings_newest_first() {
        let pool = init_memory_pool().await;
        let rows = list_market_prices(&pool, None).await.unwrap();

        let crops: Vec<&str> = rows.iter().map(|r| r.crop.as_str()).collect();
        assert_eq!(crops, vec!["Onion", "Potato", "Tomato"]);
    }

    #[tokio::test]
    async fn test_limit_returns_most_recent() {
        let pool = init_memory_pool().await;
        add_market_listing(&pool, "Wheat", 2100.0, "Local Mandi", None).await.unwrap();
        add_market_listing(&pool, "Rice", 3000.0, "City Market", Some("9000000001")).await.unwrap();
        add_market_listing(&pool, "Maize", 1700.0, "Wholesale", None).await.unwrap();

        let rows = list_market_prices(&pool, Some(2)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].crop, "Maize");
        assert_eq!(rows[1].crop, "Rice");
        assert_eq!(rows[1].phone.as_deref(), Some("9000000001"));
    }

    #[tokio::test]
    async fn test_unbounded_list_returns_everything() {
        let pool = init_memory_pool().await;
        for i in 0..5 {
            add_market_listing(&pool, &format!("Crop {}", i), 100.0 + i as f64, "Wholesale", None)
                .await
                .unwrap();
        }
        assert_eq!(list_market_prices(&pool, None).await.unwrap().len(), 8);
        assert!(list_market_prices(&pool, Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_listing_tagged_new() {
        let pool = init_memory_pool().await;
        let id = add_market_listing(&pool, "Chilli", 4200.5, "Guntur Yard", None).await.unwrap();

        let newest = &list_market_prices(&pool, Some(1)).await.unwrap()[0];
        assert_eq!(newest.id, id);
        assert_eq!(newest.trend.as_deref(), Some(NEW_LISTING_TREND));
        assert_eq!(newest.price, 4200.5);
        assert!(newest.timestamp.is_some());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some(&json!(1500))).unwrap(), 1500.0);
        assert_eq!(parse_price(Some(&json!("99.5"))).unwrap(), 99.5);
        assert!(parse_price(Some(&json!("cheap"))).is_err());
        assert!(parse_price(None).is_err());
    }

    #[tokio::test]
    async fn test_csv_export_has_header_and_rows() {
        let pool = init_memory_pool().await;
        let rows = list_market_prices(&pool, None).await.unwrap();
        let csv = String::from_utf8(market_listings_to_csv(&rows).unwrap()).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,crop,price,atlanta_retail,chicago_retail,la_retail,new_york_retail,average_spread,market,trend,phone,timestamp"
        );
        let body: Vec<&str> = lines.collect();
        assert_eq!(body.len(), 3);
        assert!(body[0].starts_with("3,Onion,"));
        assert!(body[2].contains("Local Mandi"));
    }
}
