use crate::surreal_client::SurrealClient;
use crate::types::{DbError, DbResult};
use serde_json::json;
use tracing::{debug, trace};

/// Schema version - increment when the graph schema changes
const SCHEMA_VERSION: &str = "v1";

/// Node tables
pub const NODE_TABLES: &[&str] = &["ego", "user", "circle", "feat_group", "feat_name"];

/// Relation tables; wiped before the node tables they connect
pub const EDGE_TABLES: &[&str] = &["owns", "owns_feat", "has_feat", "follows", "part_of"];

const GRAPH_SCHEMA: &str = include_str!("../schema_graph.surql");

/// Apply the ego-network graph schema to the selected database
///
/// Every statement is `IF NOT EXISTS`, so applying twice is a no-op. A
/// version marker lets later opens skip the definitions entirely.
pub async fn apply_graph_schema(client: &SurrealClient) -> DbResult<()> {
    if schema_version_present(client).await {
        debug!(version = SCHEMA_VERSION, "Graph schema already applied");
        return Ok(());
    }

    let statements = schema_statements(GRAPH_SCHEMA);
    trace!(statements = statements.len(), "Applying graph schema");

    client
        .execute(&statements.join(";\n"), &[])
        .await
        .map_err(|e| DbError::Schema(e.to_string()))?;

    client
        .execute(
            "DEFINE TABLE IF NOT EXISTS _schema_version SCHEMALESS;
             DELETE _schema_version;
             CREATE _schema_version SET version = $version;",
            &[json!({ "version": SCHEMA_VERSION })],
        )
        .await
        .map_err(|e| DbError::Schema(e.to_string()))?;

    debug!(version = SCHEMA_VERSION, "Graph schema applied");
    Ok(())
}

async fn schema_version_present(client: &SurrealClient) -> bool {
    // A missing table reads as empty
    client
        .query(
            "SELECT version FROM _schema_version WHERE version = $version LIMIT 1",
            &[json!({ "version": SCHEMA_VERSION })],
        )
        .await
        .map(|rows| !rows.is_empty())
        .unwrap_or(false)
}

/// Statements of a `.surql` file, comments removed before splitting on `;`
fn schema_statements(schema: &str) -> Vec<String> {
    strip_comments(schema)
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_applies_twice() {
        let client = SurrealClient::new_memory().await.unwrap();
        apply_graph_schema(&client).await.unwrap();
        apply_graph_schema(&client).await.unwrap();

        let marker = client
            .query("SELECT version FROM _schema_version", &[])
            .await
            .unwrap();
        assert_eq!(marker.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_key_rejects_second_record() {
        let client = SurrealClient::new_memory().await.unwrap();
        apply_graph_schema(&client).await.unwrap();

        client
            .execute("CREATE user:a SET key = 'x'", &[])
            .await
            .unwrap();
        let err = client
            .execute("CREATE user:b SET key = 'x'", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Query(_)));
    }

    #[test]
    fn test_comments_are_stripped() {
        assert_eq!(
            strip_comments("-- heading\n\nDEFINE TABLE x SCHEMALESS"),
            "DEFINE TABLE x SCHEMALESS"
        );
        assert_eq!(strip_comments("\n-- trailing only\n"), "");
    }

    #[test]
    fn test_separator_inside_comment_is_ignored() {
        let statements = schema_statements(
            "-- keys; indexes\nDEFINE TABLE a SCHEMALESS;\n-- more; notes\nDEFINE TABLE b SCHEMALESS;\n",
        );
        assert_eq!(
            statements,
            vec!["DEFINE TABLE a SCHEMALESS", "DEFINE TABLE b SCHEMALESS"]
        );
    }

    #[test]
    fn test_every_schema_statement_is_a_definition() {
        let statements = schema_statements(GRAPH_SCHEMA);
        assert_eq!(statements.len(), 22);
        for statement in &statements {
            assert!(statement.starts_with("DEFINE "), "stray text: {statement:?}");
        }
    }

    #[test]
    fn test_schema_comments_hold_no_separator() {
        for (number, line) in GRAPH_SCHEMA.lines().enumerate() {
            if line.trim_start().starts_with("--") {
                assert!(!line.contains(';'), "line {}: {line}", number + 1);
            }
        }
    }

    #[tokio::test]
    async fn test_graph_store_opens_on_fresh_datastore() {
        let client = SurrealClient::new_memory().await.unwrap();
        apply_graph_schema(&client).await.unwrap();

        let tables = client.query("INFO FOR DB", &[]).await.unwrap();
        let names = tables[0]["tables"].as_object().unwrap();
        for table in NODE_TABLES.iter().chain(EDGE_TABLES) {
            assert!(names.contains_key(*table), "missing {table}");
        }
    }
}
