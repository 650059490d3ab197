use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{UserPriceTiers, UserWithItems};
use super::histogram::HourBucket;
use super::location::UserLocations;
use super::services;
use crate::{auth::AdminUser, error::AppResult, state::AppState};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/clothing-items/admin/users-with-items", get(users_with_items))
        .route("/clothing-items/admin/histogram-data", get(histogram_data))
        .route("/clothing-items/admin/location-data", get(location_data))
        .route("/clothing-items/admin/price-tiers", get(price_tiers))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn users_with_items(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<UserWithItems>>> {
    Ok(Json(services::users_with_items(&state).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn histogram_data(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<HourBucket>>> {
    Ok(Json(services::histogram(&state.db).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn location_data(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<UserLocations>>> {
    Ok(Json(services::locations(&state.db).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn price_tiers(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<UserPriceTiers>>> {
    Ok(Json(services::price_tiers(&state.db).await?))
}
