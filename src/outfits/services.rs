use anyhow::Context;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateOutfitRequest, OutfitPiece, OutfitResponse};
use super::repo;
use super::repo_types::{NewOutfit, Outfit, OutfitRow};
use crate::db::DeleteOutcome;
use crate::error::{is_foreign_key_violation, AppError, AppResult};
use crate::items::repo as items_repo;
use crate::state::AppState;

fn parse_slot(raw: Option<String>) -> AppResult<Option<Uuid>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Invalid item id {s:?}."))),
    }
}

impl TryFrom<CreateOutfitRequest> for NewOutfit {
    type Error = AppError;

    fn try_from(req: CreateOutfitRequest) -> AppResult<Self> {
        let name = req.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::validation("Outfit name is required."));
        }
        Ok(NewOutfit {
            name: name.to_string(),
            top_id: parse_slot(req.top_id)?,
            bottom_id: parse_slot(req.bottom_id)?,
            shoes_id: parse_slot(req.shoes_id)?,
        })
    }
}

const ITEMS_NOT_OWNED: &str = "Outfit items must be existing clothing items you own.";

/// Creates an outfit from 0-3 of the caller's own items. Slot categories
/// are not checked.
pub async fn create_outfit(db: &SqlitePool, user_id: Uuid, outfit: NewOutfit) -> AppResult<Outfit> {
    let ids = outfit.item_ids();
    if items_repo::count_owned(db, user_id, &ids).await? != ids.len() {
        warn!(%user_id, ?ids, "outfit references unknown or foreign items");
        return Err(AppError::validation(ITEMS_NOT_OWNED));
    }
    let created = insert_outfit(db, user_id, &outfit).await?;
    info!(outfit_id = %created.id, %user_id, "outfit created");
    Ok(created)
}

/// An item deleted after the ownership check trips the slot foreign key.
async fn insert_outfit(db: &SqlitePool, user_id: Uuid, outfit: &NewOutfit) -> AppResult<Outfit> {
    repo::insert(db, user_id, outfit).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            warn!(%user_id, "outfit item vanished before insert");
            AppError::validation(ITEMS_NOT_OWNED)
        } else {
            e.into()
        }
    })
}

pub async fn delete_outfit(db: &SqlitePool, outfit_id: Uuid, user_id: Uuid) -> AppResult<DeleteOutcome> {
    let outcome = repo::delete(db, outfit_id, user_id).await?;
    if outcome.deleted() {
        info!(%outfit_id, %user_id, "outfit deleted");
    }
    Ok(outcome)
}

async fn piece(
    st: &AppState,
    id: Option<Uuid>,
    brand: Option<String>,
    category: Option<String>,
    image_path: Option<String>,
) -> AppResult<Option<OutfitPiece>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let image_url = match &image_path {
        Some(path) => Some(
            st.storage
                .object_url(path)
                .await
                .with_context(|| format!("url for {}", path))?,
        ),
        None => None,
    };
    Ok(Some(OutfitPiece {
        id,
        brand,
        category,
        image_path,
        image_url,
    }))
}

pub async fn to_response(st: &AppState, row: OutfitRow) -> AppResult<OutfitResponse> {
    let outfit = row.outfit;
    Ok(OutfitResponse {
        top: piece(st, outfit.top_id, row.top_brand, row.top_category, row.top_image).await?,
        bottom: piece(
            st,
            outfit.bottom_id,
            row.bottom_brand,
            row.bottom_category,
            row.bottom_image,
        )
        .await?,
        shoes: piece(st, outfit.shoes_id, row.shoes_brand, row.shoes_category, row.shoes_image)
            .await?,
        outfit,
    })
}

pub async fn list_outfits(st: &AppState, user_id: Uuid) -> AppResult<Vec<OutfitResponse>> {
    let rows = repo::list_by_user(&st.db, user_id).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(to_response(st, row).await?);
    }
    Ok(out)
}
