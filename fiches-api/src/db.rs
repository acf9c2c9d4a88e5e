//! PostgreSQL Document Store
//!
//! Connection pooling with deadpool-postgres and a [`DocumentStore`]
//! implementation keeping each collection in its own table:
//!
//! ```sql
//! CREATE TABLE sheets (id TEXT PRIMARY KEY, data JSONB NOT NULL);
//! ```
//!
//! Filters are compiled to JSONB operators on `data`; partial updates are a
//! top-level merge (`data || patch`).

use ::async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use fiches_core::{Collection, ConfigError, FichesResult, StorageError};
use fiches_storage::{Document, DocumentStore, FieldUpdate, Filter, Query};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait timeout for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "fiches".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("FICHES_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("FICHES_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("FICHES_DB_NAME").unwrap_or_else(|_| "fiches".to_string()),
            user: std::env::var("FICHES_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("FICHES_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("FICHES_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("FICHES_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> FichesResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ConfigError::InvalidValue {
                field: "FICHES_DB_*".to_string(),
                value: format!("{}:{}/{}", self.host, self.port, self.dbname),
                reason: format!("Failed to create pool: {}", e),
            })?;

        Ok(pool)
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// SQL COMPILATION
// ============================================================================

/// A statement with its owned parameters.
#[derive(Debug, Clone, PartialEq)]
struct SqlQuery {
    sql: String,
    params: Vec<SqlParam>,
}

#[derive(Debug, Clone, PartialEq)]
enum SqlParam {
    Text(String),
    Json(JsonValue),
    JsonArray(Vec<JsonValue>),
}

impl SqlParam {
    fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlParam::Text(value) => value,
            SqlParam::Json(value) => value,
            SqlParam::JsonArray(values) => values,
        }
    }
}

impl SqlQuery {
    fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(SqlParam::as_sql).collect()
    }
}

fn select_all(collection: Collection) -> SqlQuery {
    SqlQuery {
        sql: format!("SELECT id, data FROM {} ORDER BY id", collection.as_str()),
        params: Vec::new(),
    }
}

fn select_filtered(collection: Collection, query: &Query) -> SqlQuery {
    let table = collection.as_str();
    let (condition, params) = match &query.filter {
        Filter::Equals { field, value } => (
            "data -> $1::text = $2::jsonb",
            vec![SqlParam::Text(field.clone()), SqlParam::Json(value.clone())],
        ),
        Filter::ArrayContains { field, value } => (
            "jsonb_typeof(data -> $1::text) = 'array' AND data -> $1::text @> $2::jsonb",
            vec![
                SqlParam::Text(field.clone()),
                SqlParam::Json(JsonValue::Array(vec![value.clone()])),
            ],
        ),
        Filter::In { field, values } => (
            "data -> $1::text = ANY($2::jsonb[])",
            vec![SqlParam::Text(field.clone()), SqlParam::JsonArray(values.clone())],
        ),
    };

    let mut sql = format!(
        "SELECT id, data FROM {} WHERE {} ORDER BY id",
        table, condition
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    SqlQuery { sql, params }
}

fn update_fields(collection: Collection, id: &str, update: &FieldUpdate) -> SqlQuery {
    SqlQuery {
        sql: format!(
            "UPDATE {} SET data = data || $2::jsonb WHERE id = $1",
            collection.as_str()
        ),
        params: vec![SqlParam::Text(id.to_string()), SqlParam::Json(update.to_patch())],
    }
}

fn create_table(collection: Collection) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY, data JSONB NOT NULL); \
         CREATE INDEX IF NOT EXISTS {table}_data_gin ON {table} USING GIN (data jsonb_path_ops);",
        table = collection.as_str()
    )
}

// ============================================================================
// DOCUMENT STORE
// ============================================================================

/// Document store backed by PostgreSQL JSONB tables.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: Pool,
}

impl PgDocumentStore {
    /// Create a new store with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> FichesResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> FichesResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StorageError::Unavailable {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Create the collection tables if they do not exist.
    pub async fn ensure_schema(&self) -> FichesResult<()> {
        let conn = self.get_conn().await?;
        for collection in Collection::ALL {
            conn.batch_execute(&create_table(collection))
                .await
                .map_err(|e| StorageError::QueryFailed {
                    collection,
                    reason: e.to_string(),
                })?;
        }
        tracing::info!("Document tables ready");
        Ok(())
    }

    async fn fetch(&self, collection: Collection, query: SqlQuery) -> FichesResult<Vec<Document>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(query.sql.as_str(), &query.param_refs())
            .await
            .map_err(|e| StorageError::QueryFailed {
                collection,
                reason: e.to_string(),
            })?;
        rows.iter().map(|row| row_to_document(collection, row)).collect()
    }
}

fn row_to_document(collection: Collection, row: &Row) -> FichesResult<Document> {
    let id: String = row.try_get("id").map_err(|e| StorageError::QueryFailed {
        collection,
        reason: e.to_string(),
    })?;
    let data: JsonValue = row.try_get("data").map_err(|e| StorageError::Decode {
        collection,
        id: id.clone(),
        reason: e.to_string(),
    })?;
    Ok(Document::new(collection, id, data))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_all(&self, collection: Collection) -> FichesResult<Vec<Document>> {
        self.fetch(collection, select_all(collection)).await
    }

    async fn query(&self, collection: Collection, query: &Query) -> FichesResult<Vec<Document>> {
        query.validate(collection)?;
        self.fetch(collection, select_filtered(collection, query)).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        update: &FieldUpdate,
    ) -> FichesResult<()> {
        let statement = update_fields(collection, id, update);
        let conn = self.get_conn().await?;
        let affected = conn
            .execute(statement.sql.as_str(), &statement.param_refs())
            .await
            .map_err(|e| StorageError::UpdateFailed {
                collection,
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if affected == 0 {
            return Err(StorageError::NotFound {
                collection,
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn health_check(&self) -> FichesResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| StorageError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
