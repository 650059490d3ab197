use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Where uploaded item photos live.
#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local {
        root: String,
    },
    S3(S3Config),
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Shared secret for admin self-registration. `None` disables it.
    pub admin_registration_key: Option<String>,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://fitfolio.sqlite".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "fitfolio".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "fitfolio-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let admin_registration_key = std::env::var("ADMIN_REGISTRATION_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            database_url,
            jwt,
            admin_registration_key,
            storage: storage_from_env()?,
            max_upload_bytes,
        })
    }
}

fn storage_from_env() -> anyhow::Result<StorageConfig> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
    match backend.as_str() {
        "local" => Ok(StorageConfig::Local {
            root: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
        }),
        "s3" => Ok(StorageConfig::S3(S3Config {
            endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
            bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
            access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
            secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        })),
        other => anyhow::bail!("unknown STORAGE_BACKEND {other:?}, expected local or s3"),
    }
}
