use anyhow::Context;
use bytes::Bytes;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::ItemResponse;
use super::repo;
use super::repo_types::{ClothingItem, NewItem};
use crate::db::DeleteOutcome;
use crate::error::{AppError, AppResult};
use crate::exif::{self, ExifData};
use crate::state::AppState;

/// Image part of an item upload.
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Text fields of an item upload, stored verbatim.
#[derive(Debug, Default, Clone)]
pub struct ItemFields {
    pub brand: Option<String>,
    pub price: Option<String>,
    pub season: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
}

/// A validated item upload: the image is present, non-empty, small enough
/// and recognisably an image.
pub struct ItemUpload {
    pub fields: ItemFields,
    body: Bytes,
    mime: &'static str,
}

impl ItemUpload {
    pub fn new(fields: ItemFields, image: Option<UploadItem>, max_bytes: usize) -> AppResult<Self> {
        let image = image.ok_or_else(|| AppError::validation("No image file provided."))?;
        if image.body.is_empty() {
            return Err(AppError::validation("Empty image file."));
        }
        if image.body.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "Image too large. Maximum size is {} bytes.",
                max_bytes
            )));
        }
        let mime = image
            .content_type
            .as_deref()
            .and_then(canonical_mime)
            .or_else(|| sniff_image(&image.body))
            .ok_or_else(|| {
                AppError::validation("Only image files are allowed (JPEG, PNG, GIF, WebP).")
            })?;
        Ok(Self {
            fields,
            body: image.body,
            mime,
        })
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }
}

fn canonical_mime(ct: &str) -> Option<&'static str> {
    match ct.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/gif" => Some("image/gif"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn ext_from_mime(ct: &str) -> &'static str {
    match ct {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Stores the image, reads its EXIF block and inserts the item.
pub async fn create_item(st: &AppState, user_id: Uuid, upload: ItemUpload) -> AppResult<ClothingItem> {
    let key = format!(
        "items/{}/{}.{}",
        user_id,
        Uuid::new_v4(),
        ext_from_mime(upload.mime)
    );
    st.storage
        .put_object(&key, upload.body.clone(), upload.mime)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let body = upload.body;
    let exif = tokio::task::spawn_blocking(move || exif::extract_from_bytes(&body))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "exif task failed");
            ExifData::default()
        });

    let new_item = NewItem {
        user_id,
        brand: upload.fields.brand,
        price: upload.fields.price,
        season: upload.fields.season,
        size: upload.fields.size,
        category: upload.fields.category,
        image_path: key,
        exif,
    };

    match repo::insert(&st.db, &new_item).await {
        Ok(item) => {
            info!(item_id = %item.id, %user_id, has_gps = item.gps_lat.is_some(), "clothing item created");
            Ok(item)
        }
        Err(e) => {
            if let Err(cleanup) = st.storage.delete_object(&new_item.image_path).await {
                error!(error = %cleanup, key = %new_item.image_path, "orphaned image after failed insert");
            }
            Err(e.into())
        }
    }
}

/// Owner-scoped delete. The image blob goes too once the row is gone.
pub async fn delete_item(st: &AppState, item_id: Uuid, user_id: Uuid) -> AppResult<DeleteOutcome> {
    let existing = repo::find_by_id(&st.db, item_id).await?;
    let outcome = repo::delete(&st.db, item_id, user_id).await?;
    if let (DeleteOutcome::Deleted, Some(item)) = (outcome, existing) {
        if let Err(e) = st.storage.delete_object(&item.image_path).await {
            error!(error = %e, key = %item.image_path, "failed to delete item image");
        }
        info!(%item_id, %user_id, "clothing item deleted");
    }
    Ok(outcome)
}

/// Attaches a fetchable URL for each item's image.
pub async fn with_urls(st: &AppState, items: Vec<ClothingItem>) -> AppResult<Vec<ItemResponse>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(with_url(st, item).await?);
    }
    Ok(out)
}

pub async fn with_url(st: &AppState, item: ClothingItem) -> AppResult<ItemResponse> {
    let image_url = st
        .storage
        .object_url(&item.image_path)
        .await
        .with_context(|| format!("url for {}", item.image_path))?;
    Ok(ItemResponse { item, image_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::User;
    use crate::state::test_support::test_state;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn image(content_type: Option<&str>) -> Option<UploadItem> {
        Some(UploadItem {
            body: Bytes::from_static(PNG),
            content_type: content_type.map(str::to_string),
        })
    }

    fn fields(brand: &str, price: &str) -> ItemFields {
        ItemFields {
            brand: Some(brand.into()),
            price: Some(price.into()),
            season: Some("Winter".into()),
            size: Some("M".into()),
            category: Some("tops".into()),
        }
    }

    async fn user(st: &AppState, email: &str) -> User {
        User::create(&st.db, "Test", email, "hash", false)
            .await
            .expect("user")
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), "jpg");
        assert_eq!(ext_from_mime("image/png"), "png");
        assert_eq!(ext_from_mime("image/gif"), "gif");
        assert_eq!(ext_from_mime("image/webp"), "webp");
        assert_eq!(ext_from_mime("application/octet-stream"), "bin");
    }

    #[test]
    fn upload_requires_an_image() {
        let err = ItemUpload::new(ItemFields::default(), None, 1024).err().expect("rejected");
        assert!(matches!(err, AppError::Validation(_)));

        let empty = Some(UploadItem {
            body: Bytes::new(),
            content_type: Some("image/png".into()),
        });
        assert!(ItemUpload::new(ItemFields::default(), empty, 1024).is_err());

        assert!(ItemUpload::new(ItemFields::default(), image(Some("image/png")), 4).is_err());

        let text = Some(UploadItem {
            body: Bytes::from_static(b"hello world"),
            content_type: Some("text/plain".into()),
        });
        assert!(ItemUpload::new(ItemFields::default(), text, 1024).is_err());
    }

    #[test]
    fn upload_sniffs_when_content_type_is_unhelpful() {
        let up = ItemUpload::new(ItemFields::default(), image(Some("application/octet-stream")), 1024)
            .expect("sniffed");
        assert_eq!(up.mime(), "image/png");
        let up = ItemUpload::new(ItemFields::default(), image(Some("IMAGE/JPG")), 1024).expect("ok");
        assert_eq!(up.mime(), "image/jpeg");
    }

    #[tokio::test]
    async fn create_stores_fields_verbatim_and_image() {
        let (st, storage) = test_state().await;
        let owner = user(&st, "a@example.com").await;

        let upload = ItemUpload::new(fields("Acme", "N/A"), image(Some("image/png")), 1024).unwrap();
        let item = create_item(&st, owner.id, upload).await.expect("create");

        assert_eq!(item.user_id, owner.id);
        assert_eq!(item.brand.as_deref(), Some("Acme"));
        assert_eq!(item.price.as_deref(), Some("N/A"));
        assert!(item.image_path.starts_with(&format!("items/{}/", owner.id)));
        assert!(item.image_path.ends_with(".png"));
        assert!(storage.contains(&item.image_path));
        // no EXIF in the test image
        assert_eq!(item.gps_lat, None);
        assert_eq!(item.datetime_original, None);

        let found = repo::find_by_id(&st.db, item.id).await.unwrap().expect("found");
        assert_eq!(found.id, item.id);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_owner_scoped() {
        let (st, _) = test_state().await;
        let a = user(&st, "a@example.com").await;
        let b = user(&st, "b@example.com").await;

        let mut created = Vec::new();
        for brand in ["first", "second", "third"] {
            let up = ItemUpload::new(fields(brand, "10"), image(None), 1024).unwrap();
            created.push(create_item(&st, a.id, up).await.unwrap());
        }
        let up = ItemUpload::new(fields("other", "10"), image(None), 1024).unwrap();
        create_item(&st, b.id, up).await.unwrap();

        let listed = repo::list_by_user(&st.db, a.id).await.unwrap();
        let brands: Vec<_> = listed.iter().filter_map(|i| i.brand.as_deref()).collect();
        assert_eq!(brands, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn delete_is_owner_checked_and_removes_image() {
        let (st, storage) = test_state().await;
        let owner = user(&st, "a@example.com").await;
        let intruder = user(&st, "x@example.com").await;

        let up = ItemUpload::new(fields("Acme", "20"), image(None), 1024).unwrap();
        let item = create_item(&st, owner.id, up).await.unwrap();

        let outcome = delete_item(&st, item.id, intruder.id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFoundOrNotOwned);
        assert!(repo::find_by_id(&st.db, item.id).await.unwrap().is_some());
        assert!(storage.contains(&item.image_path));

        let outcome = delete_item(&st, item.id, owner.id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(repo::find_by_id(&st.db, item.id).await.unwrap().is_none());
        assert!(!storage.contains(&item.image_path));

        let again = delete_item(&st, item.id, owner.id).await.unwrap();
        assert_eq!(again, DeleteOutcome::NotFoundOrNotOwned);
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_items() {
        let (st, _) = test_state().await;
        let owner = user(&st, "a@example.com").await;
        let up = ItemUpload::new(fields("Acme", "20"), image(None), 1024).unwrap();
        let item = create_item(&st, owner.id, up).await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(owner.id)
            .execute(&st.db)
            .await
            .unwrap();

        assert!(repo::find_by_id(&st.db, item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_for_unknown_user_fails_and_cleans_up() {
        let (st, storage) = test_state().await;
        let up = ItemUpload::new(fields("Acme", "20"), image(None), 1024).unwrap();
        let err = create_item(&st, Uuid::new_v4(), up).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn responses_carry_image_urls() {
        let (st, _) = test_state().await;
        let owner = user(&st, "a@example.com").await;
        let up = ItemUpload::new(fields("Acme", "20"), image(None), 1024).unwrap();
        let item = create_item(&st, owner.id, up).await.unwrap();

        let res = with_urls(&st, vec![item.clone()]).await.unwrap();
        assert_eq!(res[0].image_url, format!("https://fake.local/{}", item.image_path));
        let json = serde_json::to_value(&res[0]).unwrap();
        assert_eq!(json["brand"], "Acme");
        assert_eq!(json["image_path"], item.image_path.as_str());
    }
}
