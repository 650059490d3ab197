use serde::Serialize;

use super::repo_types::ClothingItem;

/// An item as returned to clients: the stored row plus a fetchable image URL.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    #[serde(flatten)]
    pub item: ClothingItem,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
