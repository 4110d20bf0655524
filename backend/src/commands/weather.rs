use crate::extract::AppQuery;
use crate::state::AppState;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};

const OPEN_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ForecastDay {
    pub day: String,
    pub temp: String,
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WeatherReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub temp: String,
    pub condition: String,
    pub humidity: String,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

fn forecast_day(day: &str, temp: i64, icon: &str) -> ForecastDay {
    ForecastDay {
        day: day.to_string(),
        temp: format!("{}°C", temp),
        icon: icon.to_string(),
    }
}

fn report_from_upstream(city: &str, data: OwmResponse) -> WeatherReport {
    let temp = data.main.temp.trunc() as i64;
    let condition = data
        .weather
        .into_iter()
        .next()
        .map(|w| w.main)
        .unwrap_or_else(|| "Unknown".to_string());

    WeatherReport {
        city: Some(city.to_string()),
        temp: format!("{}°C", temp),
        condition,
        humidity: format!("{}%", data.main.humidity.trunc() as i64),
        forecast: vec![
            forecast_day("Today", temp, "fa-sun"),
            forecast_day("Tomorrow", temp - 1, "fa-cloud-rain"),
            forecast_day("Day After", temp + 1, "fa-cloud-sun"),
        ],
    }
}

/// Served when the upstream answers with a non-success status.
pub fn mock_report() -> WeatherReport {
    WeatherReport {
        city: None,
        temp: "28°C".to_string(),
        condition: "Sunny (Mock)".to_string(),
        humidity: "60%".to_string(),
        forecast: vec![forecast_day("Today", 28, "fa-sun")],
    }
}

/// Served when the upstream cannot be reached or returns garbage.
pub fn error_report() -> WeatherReport {
    WeatherReport {
        city: None,
        temp: "--°C".to_string(),
        condition: "Error".to_string(),
        humidity: "--%".to_string(),
        forecast: Vec::new(),
    }
}

/// Best effort: never fails, the request is bounded by the client timeout.
pub async fn fetch_weather(client: &reqwest::Client, api_key: Option<&str>, city: &str) -> WeatherReport {
    fetch_weather_from(client, OPEN_WEATHER_URL, api_key, city).await
}

async fn fetch_weather_from(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    city: &str,
) -> WeatherReport {
    let Some(api_key) = api_key else {
        return mock_report();
    };

    let response = client
        .get(url)
        .query(&[("q", city), ("appid", api_key), ("units", "metric")])
        .send()
        .await;

    match response {
        Ok(res) if res.status().is_success() => match res.json::<OwmResponse>().await {
            Ok(data) => report_from_upstream(city, data),
            Err(e) => {
                tracing::warn!("Weather API returned unexpected body: {}", e);
                error_report()
            }
        },
        Ok(res) => {
            tracing::warn!("Weather API responded with {}", res.status());
            mock_report()
        }
        Err(e) => {
            tracing::warn!("Weather API Error: {}", e);
            error_report()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

pub async fn get_weather_axum(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<WeatherQuery>,
) -> Json<WeatherReport> {
    let city = query
        .city
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.weather_default_city.clone());

    Json(fetch_weather(&state.http, state.config.weather_api_key.as_deref(), &city).await)
}
