use std::collections::HashMap;

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One GPS-tagged item joined with its owner.
#[derive(Debug, Clone, FromRow)]
pub struct GpsItemRow {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub item_id: Uuid,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub gps_lat: f64,
    pub gps_lon: f64,
    pub gps_alt: Option<f64>,
    pub datetime_original: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedItem {
    pub item_id: Uuid,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub alt: Option<f64>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocations {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<LocatedItem>,
    pub total_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Centroid>,
}

/// Mean position of the finite points, `None` when there are none.
pub fn centroid(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Centroid> {
    let (mut lat, mut lng, mut n) = (0.0, 0.0, 0usize);
    for (la, lo) in points {
        if la.is_finite() && lo.is_finite() {
            lat += la;
            lng += lo;
            n += 1;
        }
    }
    (n > 0).then(|| Centroid {
        lat: lat / n as f64,
        lng: lng / n as f64,
    })
}

/// Groups rows by owner, keeping the order in which owners first appear.
/// Users without GPS items never show up.
pub fn cluster_by_user(rows: Vec<GpsItemRow>) -> Vec<UserLocations> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut out: Vec<UserLocations> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.user_id).or_insert_with(|| {
            out.push(UserLocations {
                user_id: row.user_id,
                user_name: row.user_name.clone(),
                user_email: row.user_email.clone(),
                items: Vec::new(),
                total_items: 0,
                centroid: None,
            });
            out.len() - 1
        });
        let user = &mut out[slot];
        user.items.push(LocatedItem {
            item_id: row.item_id,
            brand: row.brand,
            category: row.category,
            lat: row.gps_lat,
            lng: row.gps_lon,
            alt: row.gps_alt,
            timestamp: row.datetime_original,
        });
        user.total_items += 1;
    }

    for user in &mut out {
        user.centroid = centroid(user.items.iter().map(|i| (i.lat, i.lng)));
    }
    out
}
