//! Embedded SurrealDB client
//!
//! Thin wrapper around `surrealdb::Surreal<Db>` that binds JSON parameters,
//! checks every statement for errors and turns the SDK's tagged values back
//! into plain JSON rows.
//!
//! ## Supported Backends
//!
//! - **Memory (Mem)**: always available; the default
//! - **File (RocksDB)**: behind the `rocksdb` feature
//!
//! ## Usage
//!
//! ```no_run
//! use egonet_surrealdb::SurrealClient;
//!
//! # async fn demo() -> Result<(), egonet_surrealdb::DbError> {
//! let client = SurrealClient::new_memory().await?;
//! client.execute("CREATE user:1 SET key = '1'", &[]).await?;
//! let rows = client.query("SELECT key FROM user", &[]).await?;
//! assert_eq!(rows[0]["key"], "1");
//! # Ok(())
//! # }
//! ```

use crate::types::{DbError, DbResult, SurrealDbConfig};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use surrealdb::engine::local::Db;
use surrealdb::{Response, Surreal};
use tracing::{debug, info};

/// Cheaply clonable handle to one embedded SurrealDB datastore
#[derive(Clone)]
pub struct SurrealClient {
    inner: Arc<SurrealClientInner>,
}

struct SurrealClientInner {
    db: Surreal<Db>,
    config: SurrealDbConfig,
}

impl std::fmt::Debug for SurrealClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl SurrealClient {
    /// Open the datastore described by `config` and select its namespace and
    /// database
    pub async fn new(config: SurrealDbConfig) -> DbResult<Self> {
        use surrealdb::engine::local::Mem;

        let db = match &config.path {
            None => Surreal::new::<Mem>(()).await.map_err(|e| {
                DbError::Connection(format!("Failed to create in-memory database: {}", e))
            })?,
            Some(path) => open_file(path).await?,
        };

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                DbError::Connection(format!(
                    "Failed to use namespace '{}' and database '{}': {}",
                    config.namespace, config.database, e
                ))
            })?;

        info!(
            namespace = %config.namespace,
            database = %config.database,
            path = ?config.path,
            "Opened SurrealDB datastore"
        );

        Ok(Self {
            inner: Arc::new(SurrealClientInner { db, config }),
        })
    }

    /// Fresh in-memory datastore; every call is isolated from the others
    pub async fn new_memory() -> DbResult<Self> {
        Self::new(SurrealDbConfig::memory()).await
    }

    pub fn config(&self) -> &SurrealDbConfig {
        &self.inner.config
    }

    /// Run SurrealQL and return the rows of the last statement as plain JSON
    ///
    /// `params` holds JSON objects whose entries are bound as `$key`.
    pub async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Value>> {
        let mut response = self.run(sql, params).await?;

        let last = response.num_statements().saturating_sub(1);
        let value: surrealdb::Value = response
            .take(last)
            .map_err(|e| DbError::Query(format!("Failed to extract query results: {}", e)))?;
        let json = serde_json::to_value(&value)
            .map_err(|e| DbError::Conversion(format!("Failed to serialize SurrealDB value: {}", e)))?;

        Ok(match unwrap_surreal_value(json) {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }

    /// Run SurrealQL for its effects only
    pub async fn execute(&self, sql: &str, params: &[Value]) -> DbResult<()> {
        self.run(sql, params).await.map(|_| ())
    }

    async fn run(&self, sql: &str, params: &[Value]) -> DbResult<Response> {
        let mut query = self.inner.db.query(sql);

        for param in params {
            if let Value::Object(map) = param {
                for (key, value) in map {
                    query = query.bind((key.clone(), value.clone()));
                }
            }
        }

        let response = query
            .await
            .map_err(|e| DbError::Query(format!("Query execution failed: {}", e)))?;

        response
            .check()
            .map_err(|e| DbError::Query(format!("Query returned error: {}", e)))
    }

    /// Release the datastore; fails while another clone is alive
    pub fn close(self) -> DbResult<()> {
        let inner = Arc::try_unwrap(self.inner).map_err(|_| {
            DbError::Connection("SurrealDB client is still shared; cannot close".to_string())
        })?;
        debug!(path = ?inner.config.path, "Closing SurrealDB datastore");
        drop(inner);
        Ok(())
    }
}

#[cfg(feature = "rocksdb")]
async fn open_file(path: &Path) -> DbResult<Surreal<Db>> {
    use surrealdb::engine::local::RocksDb;

    let location = path.to_string_lossy().into_owned();
    Surreal::new::<RocksDb>(location.as_str()).await.map_err(|e| {
        DbError::Connection(format!(
            "Failed to create file database at {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(not(feature = "rocksdb"))]
async fn open_file(path: &Path) -> DbResult<Surreal<Db>> {
    Err(DbError::Connection(format!(
        "cannot open {}: built without the `rocksdb` feature",
        path.display()
    )))
}

/// Turn SurrealDB's tagged serialization into plain JSON
///
/// `{"Number": {"Int": 3}}` becomes `3`, `{"Strand": "a"}` becomes `"a"`,
/// record ids become `"table:id"` strings and `NONE`/`NULL` become `null`.
/// Values that are already plain pass through unchanged.
pub fn unwrap_surreal_value(value: Value) -> Value {
    match value {
        Value::String(s) if s == "None" || s == "Null" => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_surreal_value).collect()),
        Value::Object(obj) => unwrap_object(obj),
        other => other,
    }
}

fn unwrap_object(mut obj: Map<String, Value>) -> Value {
    if obj.len() == 1 {
        if let Some(inner) = obj.remove("Number") {
            return unwrap_number(inner);
        }
        if let Some(inner) = obj.remove("Strand").or_else(|| obj.remove("String")) {
            return inner;
        }
        if let Some(inner) = obj.remove("Thing") {
            return unwrap_thing(inner);
        }
        if let Some(inner) = obj.remove("Array").or_else(|| obj.remove("Object")) {
            return unwrap_surreal_value(inner);
        }
        if let Some(inner) = obj.remove("Datetime").or_else(|| obj.remove("Uuid")) {
            return match inner {
                Value::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            };
        }
        if let Some(inner) = obj.remove("Bool") {
            return inner;
        }
    }

    Value::Object(
        obj.into_iter()
            .map(|(k, v)| (k, unwrap_surreal_value(v)))
            .collect(),
    )
}

fn unwrap_number(inner: Value) -> Value {
    match inner {
        Value::Object(mut num) => {
            if let Some(v) = num.remove("Int").or_else(|| num.remove("Float")) {
                return v;
            }
            match num.remove("Decimal") {
                Some(Value::String(s)) => s
                    .parse::<f64>()
                    .map(Value::from)
                    .unwrap_or(Value::String(s)),
                Some(other) => other,
                None => Value::Object(num),
            }
        }
        other => other,
    }
}

fn unwrap_thing(inner: Value) -> Value {
    let Value::Object(mut thing) = inner else {
        return inner;
    };
    let table = thing.remove("tb");
    let id = thing.remove("id").map(unwrap_surreal_value);

    match (table, id) {
        (Some(Value::String(tb)), Some(Value::String(id))) => Value::String(format!("{tb}:{id}")),
        (Some(Value::String(tb)), Some(other)) => Value::String(format!("{tb}:{other}")),
        (table, id) => {
            let mut rebuilt = thing;
            if let Some(t) = table {
                rebuilt.insert("tb".into(), t);
            }
            if let Some(i) = id {
                rebuilt.insert("id".into(), i);
            }
            Value::Object(rebuilt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_tagged_values() {
        let tagged = json!({
            "Array": [
                {"Object": {
                    "n": {"Number": {"Int": 3}},
                    "f": {"Number": {"Float": 1.25}},
                    "d": {"Number": {"Decimal": "2.5"}},
                    "s": {"Strand": "a b"},
                    "id": {"Thing": {"tb": "user", "id": {"String": "42"}}},
                    "none": "None",
                    "ok": {"Bool": true}
                }}
            ]
        });

        assert_eq!(
            unwrap_surreal_value(tagged),
            json!([{
                "n": 3, "f": 1.25, "d": 2.5, "s": "a b",
                "id": "user:42", "none": null, "ok": true
            }])
        );
    }

    #[test]
    fn test_plain_values_pass_through() {
        let plain = json!([{"key": "1", "count": 2, "nested": {"x": [1, 2]}}]);
        assert_eq!(unwrap_surreal_value(plain.clone()), plain);
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let client = SurrealClient::new_memory().await.unwrap();
        client
            .execute(
                "CREATE type::thing('user', $key) SET key = $key, label = 'user'",
                &[json!({"key": "7"})],
            )
            .await
            .unwrap();

        let rows = client
            .query("SELECT key, label FROM user", &[])
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"key": "7", "label": "user"})]);
    }

    #[tokio::test]
    async fn test_query_takes_last_statement() {
        let client = SurrealClient::new_memory().await.unwrap();
        let rows = client
            .query("LET $x = 5; RETURN [$x, $x + 1];", &[])
            .await
            .unwrap();
        assert_eq!(rows, vec![json!(5), json!(6)]);
    }

    #[tokio::test]
    async fn test_statement_error_is_reported() {
        let client = SurrealClient::new_memory().await.unwrap();
        let err = client.execute("THROW 'boom'", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Query(_)));
    }

    #[cfg(not(feature = "rocksdb"))]
    #[tokio::test]
    async fn test_file_path_requires_rocksdb_feature() {
        let err = SurrealClient::new(SurrealDbConfig::file("/tmp/egonet-graph"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[tokio::test]
    async fn test_close_requires_sole_owner() {
        let client = SurrealClient::new_memory().await.unwrap();
        let clone = client.clone();
        assert!(client.close().is_err());
        clone.close().unwrap();
    }
}
