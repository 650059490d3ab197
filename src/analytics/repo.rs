use sqlx::SqlitePool;

use super::location::GpsItemRow;

/// Every item with both coordinates, joined with its owner, by owner name.
pub async fn list_gps_items(db: &SqlitePool) -> sqlx::Result<Vec<GpsItemRow>> {
    sqlx::query_as::<_, GpsItemRow>(
        r#"
        SELECT u.id AS user_id, u.name AS user_name, u.email AS user_email,
               ci.id AS item_id, ci.brand, ci.category,
               ci.gps_lat, ci.gps_lon, ci.gps_alt, ci.datetime_original
          FROM clothing_items ci
          JOIN users u ON ci.user_id = u.id
         WHERE ci.gps_lat IS NOT NULL AND ci.gps_lon IS NOT NULL
         ORDER BY u.name, ci.created_at
        "#,
    )
    .fetch_all(db)
    .await
}
