use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of `outfits`. Each slot may be empty, and becomes empty when the
/// referenced item is deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Outfit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub top_id: Option<Uuid>,
    pub bottom_id: Option<Uuid>,
    pub shoes_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Outfit joined with the display fields of its three slots.
#[derive(Debug, Clone, FromRow)]
pub struct OutfitRow {
    #[sqlx(flatten)]
    pub outfit: Outfit,
    pub top_brand: Option<String>,
    pub top_image: Option<String>,
    pub top_category: Option<String>,
    pub bottom_brand: Option<String>,
    pub bottom_image: Option<String>,
    pub bottom_category: Option<String>,
    pub shoes_brand: Option<String>,
    pub shoes_image: Option<String>,
    pub shoes_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOutfit {
    pub name: String,
    pub top_id: Option<Uuid>,
    pub bottom_id: Option<Uuid>,
    pub shoes_id: Option<Uuid>,
}

impl NewOutfit {
    /// Distinct item ids referenced by the slots.
    pub fn item_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = [self.top_id, self.bottom_id, self.shoes_id]
            .into_iter()
            .flatten()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
