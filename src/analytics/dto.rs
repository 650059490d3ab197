use serde::Serialize;
use uuid::Uuid;

use super::price::{PriceStats, PriceTiers};
use crate::auth::dto::PublicUser;
use crate::items::dto::ItemResponse;

#[derive(Debug, Serialize)]
pub struct UserWithItems {
    #[serde(flatten)]
    pub user: PublicUser,
    pub items: Vec<ItemResponse>,
    #[serde(rename = "priceStats")]
    pub price_stats: PriceStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPriceTiers {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    #[serde(flatten)]
    pub tiers: PriceTiers,
}
