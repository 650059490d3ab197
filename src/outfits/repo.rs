use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewOutfit, Outfit, OutfitRow};
use crate::db::DeleteOutcome;

pub async fn insert(db: &SqlitePool, user_id: Uuid, outfit: &NewOutfit) -> sqlx::Result<Outfit> {
    sqlx::query_as::<_, Outfit>(
        r#"
        INSERT INTO outfits (id, user_id, name, top_id, bottom_id, shoes_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, name, top_id, bottom_id, shoes_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&outfit.name)
    .bind(outfit.top_id)
    .bind(outfit.bottom_id)
    .bind(outfit.shoes_id)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db)
    .await
}

const JOINED_SELECT: &str = r#"
        SELECT o.id, o.user_id, o.name, o.top_id, o.bottom_id, o.shoes_id, o.created_at,
               t.brand AS top_brand,    t.image_path AS top_image,    t.category AS top_category,
               b.brand AS bottom_brand, b.image_path AS bottom_image, b.category AS bottom_category,
               s.brand AS shoes_brand,  s.image_path AS shoes_image,  s.category AS shoes_category
          FROM outfits o
          LEFT JOIN clothing_items t ON o.top_id = t.id
          LEFT JOIN clothing_items b ON o.bottom_id = b.id
          LEFT JOIN clothing_items s ON o.shoes_id = s.id
"#;

/// A user's outfits, newest first, with slot details joined in.
pub async fn list_by_user(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<Vec<OutfitRow>> {
    let sql = format!(
        "{JOINED_SELECT} WHERE o.user_id = ? ORDER BY o.created_at DESC, o.rowid DESC"
    );
    sqlx::query_as::<_, OutfitRow>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await
}

pub async fn find_owned(db: &SqlitePool, outfit_id: Uuid, user_id: Uuid) -> sqlx::Result<Option<OutfitRow>> {
    let sql = format!("{JOINED_SELECT} WHERE o.id = ? AND o.user_id = ?");
    sqlx::query_as::<_, OutfitRow>(&sql)
        .bind(outfit_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn delete(db: &SqlitePool, outfit_id: Uuid, user_id: Uuid) -> sqlx::Result<DeleteOutcome> {
    let res = sqlx::query("DELETE FROM outfits WHERE id = ? AND user_id = ?")
        .bind(outfit_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(DeleteOutcome::from_rows_affected(res.rows_affected()))
}
