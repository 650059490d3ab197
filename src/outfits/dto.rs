use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Outfit;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutfitRequest {
    pub name: Option<String>,
    pub top_id: Option<String>,
    pub bottom_id: Option<String>,
    pub shoes_id: Option<String>,
}

/// Display fields of the item sitting in one outfit slot.
#[derive(Debug, Clone, Serialize)]
pub struct OutfitPiece {
    pub id: Uuid,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub image_path: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutfitResponse {
    #[serde(flatten)]
    pub outfit: Outfit,
    pub top: Option<OutfitPiece>,
    pub bottom: Option<OutfitPiece>,
    pub shoes: Option<OutfitPiece>,
}
