use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::exif::ExifData;

/// Row of `clothing_items`. Text fields are stored exactly as submitted;
/// `price` in particular may not be numeric.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClothingItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub season: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
    pub image_path: String,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub gps_alt: Option<f64>,
    pub datetime_original: Option<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub software: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Everything needed to insert an item once its image is stored.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub user_id: Uuid,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub season: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
    pub image_path: String,
    pub exif: ExifData,
}
