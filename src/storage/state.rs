//! Persisted credential and active unit, mirrored in memory.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{init_memory_db, init_state_db, ACTIVE_UNIT_KEY, TOKEN_KEY};
use crate::errors::Result;
use crate::models::UnitId;

/// The two durable entries of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub token: Option<String>,
    pub active_unit_id: Option<UnitId>,
}

/// Durable key/value store for the session credential.
///
/// Reads are served from the in-memory mirror so request construction never
/// waits on disk; writes go to SQLite first, then to the mirror.
pub struct StateStore {
    pool: SqlitePool,
    cache: RwLock<PersistedState>,
}

impl StateStore {
    /// Open the state file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = init_state_db(path).await?;
        Self::from_pool(pool).await
    }

    /// A store that lives only as long as the process.
    pub async fn in_memory() -> Result<Self> {
        let pool = init_memory_db().await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let rows = sqlx::query("SELECT key, value FROM client_state")
            .fetch_all(&pool)
            .await?;

        let mut state = PersistedState::default();
        for row in rows {
            let key: String = row.get("key");
            let value: String = row.get("value");
            match key.as_str() {
                TOKEN_KEY => state.token = Some(value),
                ACTIVE_UNIT_KEY => match value.parse() {
                    Ok(id) => state.active_unit_id = Some(id),
                    Err(_) => tracing::warn!("Discarding unreadable active unit id {:?}", value),
                },
                _ => {}
            }
        }

        Ok(Self {
            pool,
            cache: RwLock::new(state),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn active_unit_id(&self) -> Option<UnitId> {
        self.read().active_unit_id
    }

    pub fn snapshot(&self) -> PersistedState {
        self.read().clone()
    }

    /// Persist a fresh credential together with its active unit.
    pub async fn save_credentials(&self, token: &str, active_unit_id: UnitId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for (key, value) in [
            (TOKEN_KEY, token.to_string()),
            (ACTIVE_UNIT_KEY, active_unit_id.to_string()),
        ] {
            sqlx::query(
                "INSERT INTO client_state (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(&value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut cache = self.write();
        cache.token = Some(token.to_string());
        cache.active_unit_id = Some(active_unit_id);
        Ok(())
    }

    /// Persist a new active unit for the current credential.
    ///
    /// Returns false, writing nothing, when no credential is stored.
    pub async fn save_active_unit(&self, active_unit_id: UnitId) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let written = sqlx::query(
            "INSERT INTO client_state (key, value, updated_at)
             SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM client_state WHERE key = ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(ACTIVE_UNIT_KEY)
        .bind(active_unit_id.to_string())
        .bind(&now)
        .bind(TOKEN_KEY)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        let mut cache = self.write();
        if !written || cache.token.is_none() {
            return Ok(false);
        }
        cache.active_unit_id = Some(active_unit_id);
        Ok(true)
    }

    /// Forget the credential and the active unit.
    ///
    /// The mirror is emptied before the database write so requests built
    /// concurrently stop carrying the credential even if the write fails.
    pub async fn clear(&self) -> Result<()> {
        *self.write() = PersistedState::default();

        sqlx::query("DELETE FROM client_state WHERE key IN (?, ?)")
            .bind(TOKEN_KEY)
            .bind(ACTIVE_UNIT_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, PersistedState> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, PersistedState> {
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_credentials_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.sqlite");

        let store = StateStore::open(&path).await.unwrap();
        store.save_credentials("tok-1", 7).await.unwrap();
        assert!(store.save_active_unit(9).await.unwrap());
        drop(store);

        let reopened = StateStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.snapshot(),
            PersistedState {
                token: Some("tok-1".to_string()),
                active_unit_id: Some(9),
            }
        );
    }

    #[tokio::test]
    async fn test_clear_removes_both_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.sqlite");

        let store = StateStore::open(&path).await.unwrap();
        store.save_credentials("tok-1", 7).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.snapshot(), PersistedState::default());
        drop(store);

        let reopened = StateStore::open(&path).await.unwrap();
        assert!(reopened.token().is_none());
        assert!(reopened.active_unit_id().is_none());
    }

    #[tokio::test]
    async fn test_active_unit_not_saved_without_credential() {
        let store = StateStore::in_memory().await.unwrap();
        store.save_credentials("tok-1", 7).await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.save_active_unit(2).await.unwrap());
        assert_eq!(store.snapshot(), PersistedState::default());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM client_state")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_in_memory_store_starts_empty() {
        let store = StateStore::in_memory().await.unwrap();
        assert!(store.token().is_none());
        store.save_credentials("tok", 1).await.unwrap();
        assert_eq!(store.token().as_deref(), Some("tok"));
        assert_eq!(store.active_unit_id(), Some(1));
    }
}
