//! services/state_store.rs
//! Almacén clave/valor persistente (settings, logs, stats).
//!
//! Cada `set` se aplica como una unidad: en SQLite dentro de una transacción,
//! en memoria bajo un único write lock. No hay transacciones entre llamadas;
//! los servicios hacen read-modify-write y gana el último que escribe.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteConnectOptions, Pool, QueryBuilder, Row, Sqlite, SqlitePool};
use tokio::sync::RwLock;

use crate::{
    error::MailerResult,
    models::{log_model::LogEntry, settings_model::Settings, stats_model::Stats},
};

pub const SETTINGS_KEY: &str = "settings";
pub const LOGS_KEY: &str = "logs";
pub const STATS_KEY: &str = "stats";

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Devuelve sólo las claves que existen.
    async fn get(&self, keys: &[&str]) -> MailerResult<HashMap<String, Value>>;

    async fn set(&self, values: HashMap<String, Value>) -> MailerResult<()>;
}

// ========================================================================
// SQLite
// ========================================================================

#[derive(Clone, Debug)]
pub struct SqliteStateStore {
    db_pool: Pool<Sqlite>,
}

impl SqliteStateStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteStateStore { db_pool }
    }

    /// Abre (o crea) el archivo de base de datos y corre las migraciones.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("No se pudo crear directorio {:?}", parent))?;
        }

        log::info!("Conectando a SQLite en {}", db_path.to_string_lossy());
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let db_pool = SqlitePool::connect_with(options)
            .await
            .context("No se pudo conectar a la base de datos SQLite")?;

        let store = SqliteStateStore::new(db_pool);
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Failed to run kv_store migrations")?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get(&self, keys: &[&str]) -> MailerResult<HashMap<String, Value>> {
        let mut out = HashMap::new();
        if keys.is_empty() {
            return Ok(out);
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT key, value FROM kv_store WHERE key IN (");
        let mut separated = query.separated(", ");
        for key in keys {
            separated.push_bind(*key);
        }
        separated.push_unseparated(")");

        let rows = query.build().fetch_all(&self.db_pool).await?;
        for row in rows {
            let key: String = row.try_get("key")?;
            let raw: String = row.try_get("value")?;
            out.insert(key, serde_json::from_str(&raw)?);
        }
        Ok(out)
    }

    async fn set(&self, values: HashMap<String, Value>) -> MailerResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.db_pool.begin().await?;

        for (key, value) in values {
            let raw = serde_json::to_string(&value)?;
            sqlx::query(
                r#"
                INSERT INTO kv_store (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&key)
            .bind(&raw)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// ========================================================================
// En memoria (tests)
// ========================================================================

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, keys: &[&str]) -> MailerResult<HashMap<String, Value>> {
        let values = self.values.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| values.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_values: HashMap<String, Value>) -> MailerResult<()> {
        let mut values = self.values.write().await;
        values.extend(new_values);
        Ok(())
    }
}

// ========================================================================
// Helpers tipados
// ========================================================================

pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> MailerResult<Option<T>> {
    let mut result = store.get(&[key]).await?;
    match result.remove(key) {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn entry<T: Serialize>(key: &str, value: &T) -> MailerResult<(String, Value)> {
    Ok((key.to_string(), serde_json::to_value(value)?))
}

pub async fn load_settings(store: &dyn StateStore) -> MailerResult<Settings> {
    Ok(get_typed(store, SETTINGS_KEY).await?.unwrap_or_default())
}

pub async fn save_settings(store: &dyn StateStore, settings: &Settings) -> MailerResult<()> {
    store
        .set(HashMap::from([entry(SETTINGS_KEY, settings)?]))
        .await
}

/// Stats ausentes equivalen a contadores en cero con fecha de hoy.
pub async fn load_stats(store: &dyn StateStore, today: NaiveDate) -> MailerResult<Stats> {
    Ok(get_typed(store, STATS_KEY)
        .await?
        .unwrap_or_else(|| Stats::new(today)))
}

pub async fn load_logs(store: &dyn StateStore) -> MailerResult<Vec<LogEntry>> {
    Ok(get_typed(store, LOGS_KEY).await?.unwrap_or_default())
}

/// Primer arranque: escribe settings, logs y stats por defecto si no hay settings.
/// Devuelve true si sembró valores.
pub async fn seed_defaults(store: &dyn StateStore, today: NaiveDate) -> MailerResult<bool> {
    if get_typed::<Value>(store, SETTINGS_KEY).await?.is_some() {
        return Ok(false);
    }

    store
        .set(HashMap::from([
            entry(SETTINGS_KEY, &Settings::default())?,
            entry(LOGS_KEY, &Vec::<LogEntry>::new())?,
            entry(STATS_KEY, &Stats::new(today))?,
        ]))
        .await?;
    log::info!("Estado inicial creado con settings por defecto");
    Ok(true)
}
