//! Reference datasets behind the chat assistant.
//!
//! Loaded once at startup and shared read-only through `AppState`. A missing
//! or unreadable dataset leaves that half of the knowledge base empty; the
//! assistant then falls back to its keyword rules.

use crate::error::AgriResult;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DISEASE_NAME_COLUMN: &str = "Disease Name";
const TREATMENT_COLUMN: &str = "Recommended Treatment";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: String,
    pub season: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseAdvice {
    /// Lower-cased, as matched against chat messages.
    pub name: String,
    pub treatment: String,
}

#[derive(Debug, Default, Clone)]
pub struct KnowledgeBase {
    pub crops: Vec<CropProfile>,
    pub diseases: Vec<DiseaseAdvice>,
}

impl KnowledgeBase {
    pub fn new(crops: Vec<CropProfile>, diseases: Vec<DiseaseAdvice>) -> Self {
        Self { crops, diseases }
    }

    pub fn load(crop_path: &Path, disease_path: &Path) -> Self {
        let crops = if crop_path.exists() {
            load_crops(crop_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load crop dataset {:?}: {}", crop_path, e);
                Vec::new()
            })
        } else {
            tracing::warn!("Crop dataset not found at {:?}", crop_path);
            Vec::new()
        };

        let diseases = if disease_path.exists() {
            load_diseases(disease_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load disease dataset {:?}: {}", disease_path, e);
                Vec::new()
            })
        } else {
            tracing::warn!("Disease dataset not found at {:?}", disease_path);
            Vec::new()
        };

        tracing::info!(
            "Knowledge base loaded: {} crops, {} diseases",
            crops.len(),
            diseases.len()
        );
        Self::new(crops, diseases)
    }
}

fn load_crops(path: &Path) -> AgriResult<Vec<CropProfile>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn load_diseases(path: &Path) -> AgriResult<Vec<DiseaseAdvice>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;

    let names = df.column(DISEASE_NAME_COLUMN)?.str()?;
    let treatments = df.column(TREATMENT_COLUMN)?.str()?;

    let diseases = names
        .into_iter()
        .zip(treatments.into_iter())
        .filter_map(|(name, treatment)| match (name, treatment) {
            (Some(name), Some(treatment)) if !name.trim().is_empty() => Some(DiseaseAdvice {
                name: name.trim().to_lowercase(),
                treatment: treatment.to_string(),
            }),
            _ => None,
        })
        .collect();

    Ok(diseases)
}
