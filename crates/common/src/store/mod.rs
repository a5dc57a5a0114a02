//! Category store
//!
//! One keyed namespace per document category, shared between the gateway
//! (read-only) and the ingestion worker (read-write). Provides:
//! - A backend seam: Redis for production, in-memory for dev/tests
//! - Generic per-category stores with `get_all` and idempotent `upsert`
//! - The repository aggregating the seven category stores
//!
//! An upsert is a single keyed SET of the full serialized document, so a
//! concurrent reader never observes a partially written entity; for the
//! same key the last completed write wins.

use crate::config::StoreConfig;
use crate::domain::{
    Category, Document, DpDocument, IfDocument, MsDocument, OpDocument, PmDocument, TnDocument,
    TrDocument,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Keyed string storage underneath the category stores.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Get the value at `key`, if present.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Atomically set `key` to `value`, inserting or replacing.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// All keys starting with `prefix`, in unspecified order.
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check connectivity.
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed storage, the production backend.
pub struct RedisBackend {
    connection: RwLock<MultiplexedConnection>,
}

impl RedisBackend {
    /// Connect to the Redis server at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(|e| AppError::Store {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection =
            client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| AppError::Store {
                    message: format!("Failed to connect to Redis: {}", e),
                })?;

        info!(url = %url, "Connected to Redis store");

        Ok(Self {
            connection: RwLock::new(connection),
        })
    }
}

#[async_trait]
impl StoreBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn.get(key).await.map_err(|e| AppError::Store {
            message: format!("Failed to get key '{}': {}", key, e),
        })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.connection.write().await;
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| AppError::Store {
                message: format!("Failed to set key '{}': {}", key, e),
            })?;
        Ok(())
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.connection.write().await;
        let pattern = format!("{prefix}*");
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await
                .map_err(|e| AppError::Store {
                    message: format!("Failed to scan keys '{}': {}", pattern, e),
                })?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.write().await;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| AppError::Store {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

/// In-memory storage for local development and tests.
///
/// Mirrors the Redis backend's semantics: keyed whole-value writes, no
/// partial states.
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .data
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A keyed store for the documents of one category.
///
/// Keys are `{prefix}:{namespace}:{project_id}`; values are the serialized
/// document JSON.
pub struct ProjectStore<T: Document> {
    backend: Arc<dyn StoreBackend>,
    key_prefix: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> ProjectStore<T> {
    fn new(backend: Arc<dyn StoreBackend>, prefix: &str) -> Self {
        Self {
            backend,
            key_prefix: format!("{}:{}:", prefix, T::category().namespace()),
            _marker: PhantomData,
        }
    }

    fn key(&self, project_id: &str) -> String {
        format!("{}{}", self.key_prefix, project_id)
    }

    /// Insert a new document or replace the stored one with the new value.
    ///
    /// Whole-value replacement by natural key; no merge of partial fields.
    pub async fn upsert(&self, document: &T) -> Result<()> {
        let json = serde_json::to_string(document)?;
        let key = self.key(document.project_id());
        self.backend.set(&key, json).await?;
        debug!(key = %key, "Document upserted");
        Ok(())
    }

    /// Get one document by project id.
    pub async fn get(&self, project_id: &str) -> Result<Option<T>> {
        match self.backend.get(&self.key(project_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Get all documents in the category, sorted by project id.
    ///
    /// Deterministic and side-effect-free; documents upserted concurrently
    /// are either fully visible or not yet visible.
    pub async fn get_all(&self) -> Result<Vec<T>> {
        // Keys share the namespace prefix, so sorting keys sorts by id
        let mut keys = self.backend.scan_keys(&self.key_prefix).await?;
        keys.sort();

        let mut documents = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(json) = self.backend.get(&key).await? {
                documents.push(serde_json::from_str(&json)?);
            }
        }
        Ok(documents)
    }
}

/// The repository of documentation projects, organized around project
/// categories for fast access.
pub struct ProjectRepository {
    backend: Arc<dyn StoreBackend>,
    pub ssdc_ms: ProjectStore<MsDocument>,
    pub ssdc_pm: ProjectStore<PmDocument>,
    pub ssdc_if: ProjectStore<IfDocument>,
    pub ssdc_dp: ProjectStore<DpDocument>,
    pub ssdc_tr: ProjectStore<TrDocument>,
    pub ssdc_tn: ProjectStore<TnDocument>,
    pub ssdc_op: ProjectStore<OpDocument>,
}

impl ProjectRepository {
    /// Build the seven category stores over one shared backend.
    pub fn new(backend: Arc<dyn StoreBackend>, key_prefix: &str) -> Self {
        Self {
            ssdc_ms: ProjectStore::new(backend.clone(), key_prefix),
            ssdc_pm: ProjectStore::new(backend.clone(), key_prefix),
            ssdc_if: ProjectStore::new(backend.clone(), key_prefix),
            ssdc_dp: ProjectStore::new(backend.clone(), key_prefix),
            ssdc_tr: ProjectStore::new(backend.clone(), key_prefix),
            ssdc_tn: ProjectStore::new(backend.clone(), key_prefix),
            ssdc_op: ProjectStore::new(backend.clone(), key_prefix),
            backend,
        }
    }

    /// Connect the backend named by the store configuration.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let backend: Arc<dyn StoreBackend> = match config.backend.as_str() {
            "redis" => Arc::new(RedisBackend::connect(&config.url).await?),
            "memory" => Arc::new(MemoryBackend::new()),
            other => {
                return Err(AppError::Configuration {
                    message: format!("Unknown store backend '{}'", other),
                })
            }
        };
        Ok(Self::new(backend, &config.key_prefix))
    }

    /// Check store connectivity.
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }

    /// Get all documents in a category as JSON values, sorted by project id.
    ///
    /// The gateway serves category listings through this without caring
    /// which document type the category holds.
    pub async fn get_all_raw(&self, category: Category) -> Result<Vec<serde_json::Value>> {
        fn to_values<T: Document>(docs: Vec<T>) -> Result<Vec<serde_json::Value>> {
            docs.iter()
                .map(|d| serde_json::to_value(d).map_err(AppError::from))
                .collect()
        }

        match category {
            Category::SsdcMs => to_values(self.ssdc_ms.get_all().await?),
            Category::SsdcPm => to_values(self.ssdc_pm.get_all().await?),
            Category::SsdcIf => to_values(self.ssdc_if.get_all().await?),
            Category::SsdcDp => to_values(self.ssdc_dp.get_all().await?),
            Category::SsdcTr => to_values(self.ssdc_tr.get_all().await?),
            Category::SsdcTn => to_values(self.ssdc_tn.get_all().await?),
            Category::SsdcOp => to_values(self.ssdc_op.get_all().await?),
        }
    }
}
