use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{ItemResponse, MessageResponse};
use super::repo;
use super::services::{self, ItemFields, ItemUpload, UploadItem};
use crate::{
    auth::AuthUser,
    db::DeleteOutcome,
    error::{AppError, AppResult},
    extract::resource_id,
    state::AppState,
};

/// Room for the text fields and multipart framing around the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body cap for uploads whose image may be up to `max_image_bytes`.
pub fn upload_body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/clothing-items", get(list_items))
        .route("/clothing-items/:id", get(get_item))
}

pub fn write_routes(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/clothing-items", axum::routing::post(create_item))
        .route("/clothing-items/:id", axum::routing::delete(delete_item))
        .layer(DefaultBodyLimit::max(upload_body_limit(max_image_bytes)))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<ItemResponse>>> {
    let items = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(services::with_urls(&state, items).await?))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let id = resource_id(&id, "Clothing item")?;
    match repo::find_by_id(&state.db, id).await? {
        Some(item) if item.user_id == user_id => Ok(Json(services::with_url(&state, item).await?)),
        _ => Err(AppError::NotFoundOrNotOwned("Clothing item")),
    }
}

/// POST /clothing-items (multipart)
/// Fields: image (file), brand, price, season, size, category
#[instrument(skip(state, mp))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<(StatusCode, HeaderMap, Json<ItemResponse>)> {
    let mut fields = ItemFields::default();
    let mut image = None;

    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "bad multipart body");
        AppError::validation("Invalid multipart data.")
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field.content_type().map(str::to_string);
            let body = field
                .bytes()
                .await
                .map_err(|_| AppError::validation("Failed to read image data."))?;
            image = Some(UploadItem { body, content_type });
            continue;
        }

        let slot = match name.as_str() {
            "brand" => &mut fields.brand,
            "price" => &mut fields.price,
            "season" => &mut fields.season,
            "size" => &mut fields.size,
            "category" => &mut fields.category,
            _ => continue,
        };
        let value = field
            .text()
            .await
            .map_err(|_| AppError::validation("Invalid form field."))?;
        *slot = Some(value);
    }

    let upload = ItemUpload::new(fields, image, state.config.max_upload_bytes)?;
    let item = services::create_item(&state, user_id, upload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/clothing-items/{}", item.id)) {
        headers.insert(header::LOCATION, location);
    }
    let body = services::with_url(&state, item).await?;
    Ok((StatusCode::CREATED, headers, Json(body)))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = resource_id(&id, "Clothing item")?;
    match services::delete_item(&state, id, user_id).await? {
        DeleteOutcome::Deleted => Ok(Json(MessageResponse {
            message: "Clothing item deleted successfully.",
        })),
        DeleteOutcome::NotFoundOrNotOwned => Err(AppError::NotFoundOrNotOwned("Clothing item")),
    }
}
