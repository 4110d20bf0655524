use crate::error::{AgriError, AgriResult};
use crate::extract::AppJson;
use crate::knowledge::KnowledgeBase;
use crate::state::AppState;
use axum::extract::{Json, State};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const WELCOME_VARIANTS: [&str; 3] = [
    "Hello! I am AgriVistara AI. How can I help you today with your farming needs?",
    "Greetings! AgriVistara AI is here. What can I help you with today?",
    "Hi there! Welcome to AgriVistara. Need help with crops, soil, or market prices?",
];

const UNKNOWN_VARIANTS: [&str; 3] = [
    "That's interesting! Could you tell me more about your query? I specialize in crops, soil health, and market prices.",
    "I'm not quite sure about that. Could you rephrase your question? I'm better with farming-related topics.",
    "I'm still learning! Ask me about things like rice cultivation, tomato pests, or current market trends.",
];

const HYDROPONICS_REPLY: &str = "Hydroponics allows growing crops without soil using nutrient-rich water. It's great for leafy greens like lettuce and spinach and uses 90% less water!";
const DRIP_REPLY: &str = "Drip irrigation is highly efficient. It delivers water directly to the plant's roots, reducing waste and weed growth. Highly recommended for orchards and vegetables.";
const CROP_REPLY: &str = "I can help with crop recommendations! Please use the 'Analyze Soil' feature on your dashboard or tell me your soil N-P-K values.";
const MARKET_REPLY: &str = "Market prices are currently active. You can check the 'Market' section for live updates on tomato, wheat, and rice prices.";
const WEATHER_REPLY: &str = "Checking the sky... Currently, it's 28°C and sunny in your region. A great day for field work, but stay hydrated!";
const SUPPORT_REPLY: &str = "For immediate support, you can call us at +91 98765 43210 or email support@agrivistara.com.";

// Upper-cases the first letter of every run of letters, so word breaks
// include hyphens and apostrophes as well as spaces.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic();
    }
    out
}

fn pick<R: Rng + ?Sized>(variants: &[&'static str], rng: &mut R) -> String {
    variants.choose(rng).copied().unwrap_or_default().to_string()
}

/// Rule-based reply. Dataset matches win over the keyword rules, and the
/// keyword rules are tried in a fixed order.
pub fn reply<R: Rng + ?Sized>(kb: &KnowledgeBase, message: &str, rng: &mut R) -> String {
    let message = message.to_lowercase();
    let has = |word: &str| message.contains(word);

    if let Some(disease) = kb.diseases.iter().find(|d| has(d.name.as_str())) {
        return format!(
            "I found information on {}: {}",
            title_case(&disease.name),
            disease.treatment
        );
    }

    if let Some(crop) = kb.crops.iter().find(|c| has(c.name.to_lowercase().as_str())) {
        return format!(
            "{} is a {} grown in the {} season. {}",
            crop.name, crop.crop_type, crop.season, crop.description
        );
    }

    if has("hello") || has("hi") || has("hey") {
        pick(&WELCOME_VARIANTS, rng)
    } else if has("hydroponics") {
        HYDROPONICS_REPLY.to_string()
    } else if has("drip") && has("irrigation") {
        DRIP_REPLY.to_string()
    } else if has("crop") && (has("suggest") || has("recommend")) {
        CROP_REPLY.to_string()
    } else if has("price") || has("market") {
        MARKET_REPLY.to_string()
    } else if has("weather") {
        WEATHER_REPLY.to_string()
    } else if has("help") || has("support") {
        SUPPORT_REPLY.to_string()
    } else {
        pick(&UNKNOWN_VARIANTS, rng)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub status: String,
    pub response: String,
}

pub async fn chat_axum(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChatRequest>,
) -> AgriResult<Json<ChatResponse>> {
    let message = payload
        .message
        .ok_or_else(|| AgriError::Validation("No message provided".to_string()))?;

    // Replies are English only; other languages are logged and answered in English.
    if let Some(lang) = payload.lang.as_deref().filter(|l| *l != "en") {
        tracing::debug!("Chat requested in {}, answering in English", lang);
    }

    let response = reply(&state.knowledge, &message, &mut rand::rng());

    Ok(Json(ChatResponse {
        status: "success".to_string(),
        response,
    }))
}
