use crate::db::{DbPool, DiseaseReference};
use crate::error::{AgriError, AgriResult};
use crate::state::AppState;
use axum::extract::{multipart::MultipartRejection, Json, Multipart, Path, State};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub struct DiseaseEntry {
    pub disease: &'static str,
    pub treatment: &'static str,
    pub description: &'static str,
}

const fn entry(
    disease: &'static str,
    treatment: &'static str,
    description: &'static str,
) -> DiseaseEntry {
    DiseaseEntry {
        disease,
        treatment,
        description,
    }
}

/// Label table for the mock classifier. Order is part of the contract:
/// the digest selects an entry by position. The reference table in the
/// store is seeded from the same list.
pub const DISEASE_TABLE: [DiseaseEntry; 25] = [
    entry("Leaf Blight", "Use Fungicide X (Copper-based)", "Fungal infection affecting leaves."),
    entry("Rust", "Remove infected leaves immediately. Apply Sulfur dust.", "Reddish-brown pustules on leaves."),
    entry("Healthy", "Keep monitoring, water regularly.", "Plant is in good condition."),
    entry("Cashew anthracnose", "Prune infected parts, use copper-based fungicides.", "Dark sunken lesions on leaves, shoots and nuts."),
    entry("Cashew gumosis", "Improve drainage, apply Bordeaux paste to stems.", "Gum oozing from cracks in the bark and trunk."),
    entry("Cashew healthy", "Keep monitoring, maintain proper spacing.", "Cashew plant is in good condition."),
    entry("Cashew leaf miner", "Use Neem oil or systemic insecticides.", "Larvae tunnel inside tender leaves, leaving blisters."),
    entry("Cashew red rust", "Improve air circulation, use sulfur fungicides.", "Rusty algal patches on the upper leaf surface."),
    entry("Cassava bacterial blight", "Use healthy planting material, rotate crops.", "Angular water-soaked spots followed by leaf wilting."),
    entry("Cassava brown spot", "Plant resistant varieties, remove infected leaves.", "Brown circular spots with dark borders on older leaves."),
    entry("Cassava green mite", "Use predatory mites or biological controls.", "Mites cause yellow speckling and stunted shoot tips."),
    entry("Cassava healthy", "Keep monitoring, water regularly.", "Cassava plant is in good condition."),
    entry("Cassava mosaic", "Use disease-free stems, control whiteflies.", "Whitefly-borne virus causing mottled, distorted leaves."),
    entry("Maize fall armyworm", "Apply Neem-based pesticides or biological controls.", "Caterpillars chew ragged holes in the whorl leaves."),
    entry("Maize grasshoper", "Maintain field sanitation, use bird-friendly habitats.", "Grasshoppers strip leaf margins and defoliate plants."),
    entry("Maize healthy", "Keep monitoring, ensure proper fertilization.", "Maize plant is in good condition."),
    entry("Maize leaf beetle", "Spray soapy water or use recommended insecticides.", "Beetles scrape leaf tissue, leaving pale streaks."),
    entry("Maize leaf blight", "Use host-resistant hybrids, rotate crops.", "Long grey-green cigar-shaped lesions on leaves."),
    entry("Maize leaf spot", "Avoid overhead irrigation, use fungicides if severe.", "Small tan rectangular spots between leaf veins."),
    entry("Maize streak virus", "Control leafhoppers, plant resistant varieties.", "Leafhopper-borne virus causing yellow streaks along veins."),
    entry("Tomato healthy", "Keep monitoring, water regularly.", "Tomato plant is in good condition."),
    entry("Tomato leaf blight", "Apply copper-based fungicides, improve spacing.", "Concentric dark lesions spreading from lower leaves."),
    entry("Tomato leaf curl", "Control whiteflies, use reflective mulches.", "Whitefly-borne virus causing upward curling and stunting."),
    entry("Tomato septoria leaf spot", "Remove lower leaves, avoid overhead watering.", "Many small grey-centred spots on lower leaves."),
    entry("Tomato verticulium wilt", "Improve soil drainage, plant resistant varieties.", "Soil fungus causing V-shaped yellowing and wilting."),
];

const CONFIDENCE_BASE: u32 = 85;
const CONFIDENCE_SPREAD: u32 = 15;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Diagnosis {
    pub disease: &'static str,
    pub treatment: &'static str,
    pub confidence: u32,
}

// Digest read as a big-endian unsigned integer, reduced modulo `m`.
fn digest_mod(digest: &[u8], m: u32) -> u32 {
    digest
        .iter()
        .fold(0u32, |acc, &byte| (acc * 256 + u32::from(byte)) % m)
}

/// Mock detection: picks a label from the content hash of the image.
/// Identical bytes always give the identical diagnosis; nothing about the
/// picture itself is inspected.
pub fn classify(image: &[u8]) -> AgriResult<Diagnosis> {
    if image.is_empty() {
        return Err(AgriError::Validation("Image payload is empty".to_string()));
    }

    let digest = Sha256::digest(image);
    let index = digest_mod(&digest, DISEASE_TABLE.len() as u32) as usize;
    let picked = &DISEASE_TABLE[index];

    Ok(Diagnosis {
        disease: picked.disease,
        treatment: picked.treatment,
        confidence: CONFIDENCE_BASE + digest_mod(&digest, CONFIDENCE_SPREAD),
    })
}

pub async fn get_disease_info(pool: &DbPool, disease: &str) -> AgriResult<Option<DiseaseReference>> {
    let info = sqlx::query_as::<_, DiseaseReference>(
        "SELECT id, disease, treatment, description FROM disease_data WHERE disease = ?",
    )
    .bind(disease)
    .fetch_optional(pool)
    .await?;

    Ok(info)
}

pub async fn detect_disease_axum(
    multipart: Result<Multipart, MultipartRejection>,
) -> AgriResult<Json<Diagnosis>> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Upload is not multipart: {}", rejection.body_text());
        AgriError::Validation("No image uploaded".to_string())
    })?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        if field.file_name().map_or(true, |name| name.is_empty()) {
            return Err(AgriError::Validation("No image selected".to_string()));
        }

        let bytes = field.bytes().await?;
        let diagnosis = classify(&bytes)?;
        tracing::info!(
            "Mock diagnosis {} ({}%) for {} byte upload",
            diagnosis.disease,
            diagnosis.confidence,
            bytes.len()
        );
        return Ok(Json(diagnosis));
    }

    Err(AgriError::Validation("No image uploaded".to_string()))
}

pub async fn get_disease_info_axum(
    State(state): State<AppState>,
    Path(disease): Path<String>,
) -> AgriResult<Json<DiseaseReference>> {
    get_disease_info(&state.pool, &disease)
        .await?
        .map(Json)
        .ok_or_else(|| AgriError::NotFound(format!("No reference data for {}", disease)))
}
