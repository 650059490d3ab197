use crate::config::{AppConfig, StorageConfig};
use crate::db;
use crate::storage::{LocalStorage, S3Storage, StorageClient};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;

        let storage = match &config.storage {
            StorageConfig::Local { root } => {
                Arc::new(LocalStorage::new(root)) as Arc<dyn StorageClient>
            }
            StorageConfig::S3(s3) => {
                Arc::new(S3Storage::connect(s3).await?) as Arc<dyn StorageClient>
            }
        };

        Ok(Self::from_parts(db, config, storage))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, storage: Arc<dyn StorageClient>) -> Self {
        Self {
            db,
            config,
            storage,
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::config::{JwtConfig, DEFAULT_MAX_UPLOAD_BYTES};

    pub const TEST_ADMIN_KEY: &str = "test-admin-key";

    /// Keeps uploaded blobs in memory so tests can inspect them.
    #[derive(Default)]
    pub struct MemoryStorage {
        pub objects: Mutex<HashMap<String, (Bytes, String)>>,
    }

    impl MemoryStorage {
        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().expect("storage lock").contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.objects.lock().expect("storage lock").len()
        }
    }

    #[async_trait]
    impl StorageClient for MemoryStorage {
        async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
            self.objects
                .lock()
                .expect("storage lock")
                .insert(key.to_string(), (body, content_type.to_string()));
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.objects.lock().expect("storage lock").remove(key);
            Ok(())
        }

        async fn object_url(&self, key: &str) -> anyhow::Result<String> {
            Ok(format!("https://fake.local/{}", key))
        }
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
            admin_registration_key: Some(TEST_ADMIN_KEY.into()),
            storage: StorageConfig::Local {
                root: "unused".into(),
            },
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Fresh in-memory store plus a memory blob store.
    pub async fn test_state() -> (AppState, Arc<MemoryStorage>) {
        let db = db::connect_in_memory().await.expect("in-memory db");
        let storage = Arc::new(MemoryStorage::default());
        let state = AppState::from_parts(
            db,
            Arc::new(test_config()),
            storage.clone() as Arc<dyn StorageClient>,
        );
        (state, storage)
    }
}
