use std::str::FromStr;

use anyhow::Context;
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// Opens the store and applies the schema.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse DATABASE_URL {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let db = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("connect to database")?;

    migrate(&db).await?;
    Ok(db)
}

/// Single-connection in-memory store; every connection of a `:memory:`
/// pool would otherwise see its own empty database.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("open in-memory database")?;
    migrate(&db).await?;
    Ok(db)
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("apply migrations")?;
    Ok(())
}

/// Result of an owner-scoped delete. A missing row and a row owned by
/// someone else are indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFoundOrNotOwned,
}

impl DeleteOutcome {
    pub fn from_rows_affected(rows: u64) -> Self {
        if rows > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFoundOrNotOwned
        }
    }

    pub fn deleted(self) -> bool {
        self == DeleteOutcome::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_has_schema_and_foreign_keys() {
        let db = connect_in_memory().await.expect("open");
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(&db)
        .await
        .expect("list tables");
        assert_eq!(tables, vec!["clothing_items", "outfits", "users"]);

        let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&db)
            .await
            .expect("pragma");
        assert_eq!(fk, 1);
    }

    #[test]
    fn delete_outcome_from_rows() {
        assert_eq!(DeleteOutcome::from_rows_affected(1), DeleteOutcome::Deleted);
        assert_eq!(
            DeleteOutcome::from_rows_affected(0),
            DeleteOutcome::NotFoundOrNotOwned
        );
        assert!(!DeleteOutcome::NotFoundOrNotOwned.deleted());
    }
}
