use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ClothingItem, NewItem};
use crate::db::DeleteOutcome;

const ITEM_COLUMNS: &str = "id, user_id, brand, price, season, size, category, image_path, \
     gps_lat, gps_lon, gps_alt, datetime_original, camera_make, camera_model, software, created_at";

pub async fn insert(db: &SqlitePool, item: &NewItem) -> sqlx::Result<ClothingItem> {
    let sql = format!(
        r#"
        INSERT INTO clothing_items
            (id, user_id, brand, price, season, size, category, image_path,
             gps_lat, gps_lon, gps_alt, datetime_original, camera_make, camera_model, software,
             created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {ITEM_COLUMNS}
        "#
    );
    sqlx::query_as::<_, ClothingItem>(&sql)
        .bind(Uuid::new_v4())
        .bind(item.user_id)
        .bind(&item.brand)
        .bind(&item.price)
        .bind(&item.season)
        .bind(&item.size)
        .bind(&item.category)
        .bind(&item.image_path)
        .bind(item.exif.gps_lat)
        .bind(item.exif.gps_lon)
        .bind(item.exif.gps_alt)
        .bind(&item.exif.datetime_original)
        .bind(&item.exif.camera_make)
        .bind(&item.exif.camera_model)
        .bind(&item.exif.software)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
}

/// A user's items, newest first.
pub async fn list_by_user(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<Vec<ClothingItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM clothing_items WHERE user_id = ? \
         ORDER BY created_at DESC, rowid DESC"
    );
    sqlx::query_as::<_, ClothingItem>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await
}

/// Every item of every user, newest first.
pub async fn list_all(db: &SqlitePool) -> sqlx::Result<Vec<ClothingItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM clothing_items ORDER BY created_at DESC, rowid DESC"
    );
    sqlx::query_as::<_, ClothingItem>(&sql).fetch_all(db).await
}

/// Single-row lookup without an ownership check.
pub async fn find_by_id(db: &SqlitePool, item_id: Uuid) -> sqlx::Result<Option<ClothingItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM clothing_items WHERE id = ?");
    sqlx::query_as::<_, ClothingItem>(&sql)
        .bind(item_id)
        .fetch_optional(db)
        .await
}

/// Deletes the item only when `user_id` owns it.
pub async fn delete(db: &SqlitePool, item_id: Uuid, user_id: Uuid) -> sqlx::Result<DeleteOutcome> {
    let res = sqlx::query("DELETE FROM clothing_items WHERE id = ? AND user_id = ?")
        .bind(item_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(DeleteOutcome::from_rows_affected(res.rows_affected()))
}

/// Items among `item_ids` that belong to `user_id`.
pub async fn count_owned(db: &SqlitePool, user_id: Uuid, item_ids: &[Uuid]) -> sqlx::Result<usize> {
    let mut owned = 0;
    for id in item_ids {
        let hit: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM clothing_items WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        owned += usize::from(hit.is_some());
    }
    Ok(owned)
}

/// Capture timestamps of every item that has one.
pub async fn list_capture_times(db: &SqlitePool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(
        r#"
        SELECT datetime_original
          FROM clothing_items
         WHERE datetime_original IS NOT NULL
         ORDER BY datetime_original
        "#,
    )
    .fetch_all(db)
    .await
}
