use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::dto::{UserPriceTiers, UserWithItems};
use super::histogram::{hourly_histogram, HourBucket};
use super::location::{cluster_by_user, UserLocations};
use super::price::{valid_prices, PriceStats, PriceTiers};
use super::repo;
use crate::auth::repo_types::User;
use crate::error::AppResult;
use crate::items::{repo as items_repo, repo_types::ClothingItem, services::with_urls};
use crate::state::AppState;

async fn items_by_owner(db: &SqlitePool) -> sqlx::Result<HashMap<Uuid, Vec<ClothingItem>>> {
    let mut grouped: HashMap<Uuid, Vec<ClothingItem>> = HashMap::new();
    for item in items_repo::list_all(db).await? {
        grouped.entry(item.user_id).or_default().push(item);
    }
    Ok(grouped)
}

fn prices_of(items: &[ClothingItem]) -> Vec<f64> {
    valid_prices(items.iter().map(|i| i.price.as_deref()))
}

/// Every user with their items and price statistics, users by name.
pub async fn users_with_items(st: &AppState) -> AppResult<Vec<UserWithItems>> {
    let users = User::list_all(&st.db).await?;
    let mut items = items_by_owner(&st.db).await?;

    let mut out = Vec::with_capacity(users.len());
    for user in users {
        let owned = items.remove(&user.id).unwrap_or_default();
        let price_stats = PriceStats::from_prices(&prices_of(&owned));
        out.push(UserWithItems {
            user: user.into(),
            items: with_urls(st, owned).await?,
            price_stats,
        });
    }
    debug!(users = out.len(), "built admin user overview");
    Ok(out)
}

pub async fn price_tiers(db: &SqlitePool) -> AppResult<Vec<UserPriceTiers>> {
    let users = User::list_all(db).await?;
    let items = items_by_owner(db).await?;

    Ok(users
        .into_iter()
        .map(|user| {
            let prices = items.get(&user.id).map(|v| prices_of(v)).unwrap_or_default();
            UserPriceTiers {
                user_id: user.id,
                user_name: user.name,
                user_email: user.email,
                tiers: PriceTiers::from_prices(&prices),
            }
        })
        .collect())
}

pub async fn histogram(db: &SqlitePool) -> AppResult<Vec<HourBucket>> {
    let stamps = items_repo::list_capture_times(db).await?;
    Ok(hourly_histogram(stamps))
}

pub async fn locations(db: &SqlitePool) -> AppResult<Vec<UserLocations>> {
    let rows = repo::list_gps_items(db).await?;
    Ok(cluster_by_user(rows))
}
