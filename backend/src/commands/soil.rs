use crate::db::DbPool;
use crate::error::{AgriError, AgriResult};
use crate::state::AppState;
use axum::extract::{rejection::JsonRejection, Json, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NUTRIENT: f64 = 0.0;
pub const DEFAULT_PH: f64 = 7.0;

/// Maps soil readings to a crop. Rules are checked in order and the first
/// matching rule decides, so a high-nitrogen reading never reaches the
/// neutral-pH rule even when the pH is in range.
pub fn recommend_crop(n: f64, p: f64, k: f64, ph: f64) -> &'static str {
    if ph < 5.0 {
        if k > 50.0 { "Tea" } else { "Blueberry" }
    } else if ph > 8.0 {
        if n > 80.0 { "Barley" } else { "Date Palm" }
    } else if n > 120.0 {
        if p > 60.0 { "Cotton" } else { "Sugar Cane" }
    } else if n < 40.0 {
        if k > 40.0 { "Legumes (Beans)" } else { "Peanuts" }
    } else if p > 80.0 {
        if ph > 6.5 { "Grapes" } else { "Apple" }
    } else if k > 100.0 {
        if n > 100.0 { "Banana" } else { "Potato" }
    } else if k < 30.0 {
        if n > 60.0 { "Spinach" } else { "Carrot" }
    } else if (6.0..=7.0).contains(&ph) {
        if n > 80.0 {
            "Wheat"
        } else if p > 50.0 {
            "Rice"
        } else {
            "Maize"
        }
    } else {
        "Millets"
    }
}

/// Accepts JSON numbers and numeric strings; anything else yields `default`.
pub fn coerce_reading(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(default)
}

pub async fn save_soil_test(
    pool: &DbPool,
    user_phone: Option<&str>,
    n: f64,
    p: f64,
    k: f64,
    ph: f64,
    recommendation: &str,
) -> AgriResult<i64> {
    let result = sqlx::query(
        "INSERT INTO soil_tests (user_phone, n_val, p_val, k_val, ph_val, recommendation) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_phone)
    .bind(n)
    .bind(p)
    .bind(k)
    .bind(ph)
    .bind(recommendation)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub status: String,
    pub recommended_crop: String,
    pub confidence: String,
}

// Body is taken as a loose JSON value so "45" and 45 are both accepted.
// A body that is not JSON at all counts as no data.
pub async fn recommend_axum(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AgriResult<Json<RecommendResponse>> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!("Unreadable recommend body: {}", rejection.body_text());
            Value::Null
        }
    };
    let data = payload
        .as_object()
        .filter(|obj| !obj.is_empty())
        .ok_or_else(|| AgriError::Validation("No data provided".to_string()))?;

    let n = coerce_reading(data.get("N"), DEFAULT_NUTRIENT);
    let p = coerce_reading(data.get("P"), DEFAULT_NUTRIENT);
    let k = coerce_reading(data.get("K"), DEFAULT_NUTRIENT);
    let ph = coerce_reading(data.get("ph"), DEFAULT_PH);

    let crop = recommend_crop(n, p, k, ph);

    let phone = data.get("phone").and_then(|v| v.as_str());
    if let Err(e) = save_soil_test(&state.pool, phone, n, p, k, ph, crop).await {
        tracing::error!("Failed to save soil test: {}", e);
    }

    Ok(Json(RecommendResponse {
        status: "success".to_string(),
        recommended_crop: crop.to_string(),
        confidence: "85%".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_pool, SoilTestRecord};
    use serde_json::json;

    #[test]
    fn test_each_rule_in_cascade() {
        assert_eq!(recommend_crop(0.0, 0.0, 60.0, 4.5), "Tea");
        assert_eq!(recommend_crop(0.0, 0.0, 50.0, 4.9), "Blueberry");
        assert_eq!(recommend_crop(90.0, 0.0, 0.0, 8.5), "Barley");
        assert_eq!(recommend_crop(80.0, 0.0, 0.0, 8.1), "Date Palm");
        assert_eq!(recommend_crop(121.0, 61.0, 50.0, 7.0), "Cotton");
        assert_eq!(recommend_crop(121.0, 60.0, 50.0, 7.0), "Sugar Cane");
        assert_eq!(recommend_crop(39.0, 0.0, 41.0, 7.0), "Legumes (Beans)");
        assert_eq!(recommend_crop(39.0, 0.0, 40.0, 7.0), "Peanuts");
        assert_eq!(recommend_crop(60.0, 81.0, 50.0, 6.6), "Grapes");
        assert_eq!(recommend_crop(60.0, 81.0, 50.0, 6.5), "Apple");
        assert_eq!(recommend_crop(101.0, 50.0, 101.0, 7.0), "Banana");
        assert_eq!(recommend_crop(100.0, 50.0, 101.0, 7.0), "Potato");
        assert_eq!(recommend_crop(61.0, 50.0, 29.0, 7.0), "Spinach");
        assert_eq!(recommend_crop(60.0, 50.0, 29.0, 7.0), "Carrot");
        assert_eq!(recommend_crop(81.0, 0.0, 50.0, 6.0), "Wheat");
        assert_eq!(recommend_crop(80.0, 51.0, 50.0, 7.0), "Rice");
        assert_eq!(recommend_crop(80.0, 50.0, 50.0, 6.5), "Maize");
        assert_eq!(recommend_crop(80.0, 50.0, 50.0, 7.5), "Millets");
        assert_eq!(recommend_crop(80.0, 50.0, 50.0, 5.5), "Millets");
    }

    #[test]
    fn test_earlier_rule_shadows_ph_range() {
        assert_eq!(recommend_crop(130.0, 70.0, 10.0, 6.5), "Cotton");
        assert_eq!(recommend_crop(20.0, 0.0, 50.0, 7.0), "Legumes (Beans)");
        // K=0 hits the low-potassium rule before the pH range is considered
        assert_eq!(recommend_crop(90.0, 0.0, 0.0, 6.5), "Spinach");
        assert_eq!(recommend_crop(90.0, 0.0, 50.0, 6.5), "Wheat");
    }

    #[test]
    fn test_boundaries_are_strict() {
        // pH exactly 5.0 / 8.0 falls through the acid / alkaline rules
        assert_eq!(recommend_crop(60.0, 50.0, 50.0, 5.0), "Millets");
        assert_eq!(recommend_crop(60.0, 50.0, 50.0, 8.0), "Millets");
        // N exactly 120 / 40 falls through as well
        assert_eq!(recommend_crop(120.0, 0.0, 50.0, 6.5), "Wheat");
        assert_eq!(recommend_crop(40.0, 0.0, 50.0, 6.5), "Maize");
    }

    #[test]
    fn test_all_defaults() {
        // All-missing input: N=0 triggers the low-nitrogen rule.
        assert_eq!(
            recommend_crop(DEFAULT_NUTRIENT, DEFAULT_NUTRIENT, DEFAULT_NUTRIENT, DEFAULT_PH),
            "Peanuts"
        );
    }

    #[test]
    fn test_recommendation_is_repeatable() {
        let first = recommend_crop(55.5, 42.0, 77.0, 6.3);
        for _ in 0..10 {
            assert_eq!(recommend_crop(55.5, 42.0, 77.0, 6.3), first);
        }
    }

    #[test]
    fn test_coerce_reading() {
        let body = json!({
            "N": 45,
            "P": "12.5",
            "K": " 7 ",
            "ph": "acidic",
            "bad": null,
            "flag": true,
        });
        assert_eq!(coerce_reading(body.get("N"), 0.0), 45.0);
        assert_eq!(coerce_reading(body.get("P"), 0.0), 12.5);
        assert_eq!(coerce_reading(body.get("K"), 0.0), 7.0);
        assert_eq!(coerce_reading(body.get("ph"), DEFAULT_PH), DEFAULT_PH);
        assert_eq!(coerce_reading(body.get("bad"), 0.0), 0.0);
        assert_eq!(coerce_reading(body.get("flag"), 0.0), 0.0);
        assert_eq!(coerce_reading(body.get("missing"), DEFAULT_PH), DEFAULT_PH);
        assert_eq!(coerce_reading(Some(&json!("NaN")), 0.0), 0.0);
    }

    #[tokio::test]
    async fn test_save_soil_test_appends() {
        let pool = init_memory_pool().await;

        save_soil_test(&pool, Some("9000000001"), 90.0, 0.0, 50.0, 6.5, "Wheat")
            .await
            .unwrap();
        save_soil_test(&pool, None, 20.0, 0.0, 50.0, 7.0, "Legumes (Beans)")
            .await
            .unwrap();

        let rows = sqlx::query_as::<_, SoilTestRecord>("SELECT * FROM soil_tests ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_phone.as_deref(), Some("9000000001"));
        assert_eq!(rows[0].recommendation.as_deref(), Some("Wheat"));
        assert_eq!(rows[0].ph_val, Some(6.5));
        assert!(rows[1].user_phone.is_none());
        assert!(rows[1].timestamp.is_some());
    }
}
