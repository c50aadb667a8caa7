//! Schema management and migrations

use crate::error::{SqliteError, SqliteResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Tables in child-first order; wipe and count walk this list
pub const TABLES: &[&str] = &[
    "circle_member",
    "node_feature",
    "edge",
    "circle",
    "user_node",
    "ego",
    "feature_name",
    "feature_group",
    "node",
];

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: normalized ego-network schema
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: ego-network schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

const SCHEMA_V1: &str = r#"
-- ============================================================================
-- Nodes: every ego and user, ids unique across the corpus
-- ============================================================================

CREATE TABLE IF NOT EXISTS node (
    node_id TEXT PRIMARY KEY NOT NULL,
    node_type TEXT NOT NULL CHECK (node_type IN ('ego', 'user'))
);

CREATE TABLE IF NOT EXISTS ego (
    node_id TEXT PRIMARY KEY NOT NULL REFERENCES node(node_id) ON DELETE CASCADE
);

-- One row per (user, ego network); a user shared by several egos appears once per ego
CREATE TABLE IF NOT EXISTS user_node (
    node_id TEXT NOT NULL REFERENCES node(node_id) ON DELETE CASCADE,
    ego_id TEXT NOT NULL REFERENCES ego(node_id) ON DELETE CASCADE,
    PRIMARY KEY (node_id, ego_id)
);

CREATE INDEX IF NOT EXISTS idx_user_node_ego ON user_node(ego_id);

-- ============================================================================
-- Circles: names are unique only within their ego
-- ============================================================================

CREATE TABLE IF NOT EXISTS circle (
    ego_id TEXT NOT NULL REFERENCES ego(node_id) ON DELETE CASCADE,
    circle_id TEXT NOT NULL,
    PRIMARY KEY (ego_id, circle_id)
);

CREATE TABLE IF NOT EXISTS circle_member (
    ego_id TEXT NOT NULL,
    circle_id TEXT NOT NULL,
    node_id TEXT NOT NULL REFERENCES node(node_id) ON DELETE CASCADE,
    PRIMARY KEY (ego_id, circle_id, node_id),
    FOREIGN KEY (ego_id, circle_id) REFERENCES circle(ego_id, circle_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_circle_member_node ON circle_member(node_id);

-- ============================================================================
-- Feature vocabulary: surrogate ids, names unique per group
-- ============================================================================

CREATE TABLE IF NOT EXISTS feature_group (
    group_id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS feature_name (
    feature_id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id INTEGER NOT NULL REFERENCES feature_group(group_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    UNIQUE (group_id, name)
);

CREATE TABLE IF NOT EXISTS node_feature (
    node_id TEXT NOT NULL REFERENCES node(node_id) ON DELETE CASCADE,
    feature_id INTEGER NOT NULL REFERENCES feature_name(feature_id) ON DELETE CASCADE,
    PRIMARY KEY (node_id, feature_id)
);

CREATE INDEX IF NOT EXISTS idx_node_feature_feature ON node_feature(feature_id);

-- ============================================================================
-- Directed follow edges, scoped to the ego network that declared them
-- ============================================================================

CREATE TABLE IF NOT EXISTS edge (
    src_id TEXT NOT NULL REFERENCES node(node_id) ON DELETE CASCADE,
    dst_id TEXT NOT NULL REFERENCES node(node_id) ON DELETE CASCADE,
    ego_id TEXT NOT NULL REFERENCES ego(node_id) ON DELETE CASCADE,
    PRIMARY KEY (src_id, dst_id, ego_id)
);

CREATE INDEX IF NOT EXISTS idx_edge_ego ON edge(ego_id);
"#;
