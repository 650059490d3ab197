use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateOutfitRequest, OutfitResponse};
use super::repo;
use super::repo_types::NewOutfit;
use super::services;
use crate::{
    auth::AuthUser,
    db::DeleteOutcome,
    error::{AppError, AppResult},
    extract::{resource_id, AppJson},
    items::dto::MessageResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/outfits", get(list_outfits).post(create_outfit))
        .route("/outfits/:id", delete(delete_outfit))
}

#[instrument(skip(state))]
pub async fn list_outfits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<OutfitResponse>>> {
    Ok(Json(services::list_outfits(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateOutfitRequest>,
) -> AppResult<(StatusCode, Json<OutfitResponse>)> {
    let outfit = NewOutfit::try_from(payload)?;
    let created = services::create_outfit(&state.db, user_id, outfit).await?;

    let body = match repo::find_owned(&state.db, created.id, user_id).await? {
        Some(row) => services::to_response(&state, row).await?,
        None => return Err(AppError::NotFoundOrNotOwned("Outfit")),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state))]
pub async fn delete_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = resource_id(&id, "Outfit")?;
    match services::delete_outfit(&state.db, id, user_id).await? {
        DeleteOutcome::Deleted => Ok(Json(MessageResponse {
            message: "Outfit deleted successfully.",
        })),
        DeleteOutcome::NotFoundOrNotOwned => Err(AppError::NotFoundOrNotOwned("Outfit")),
    }
}
