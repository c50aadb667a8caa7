//! Timed execution of named query sets
//!
//! A [`QuerySet`] pairs a complexity class with ordered `(name, query)`
//! entries. [`BenchmarkRunner::run`] executes every entry against a
//! [`QueryBackend`] and produces one [`MetricRecord`] per successful query.
//! Failures are collected and never abort the set.

use crate::error::StoreError;
use crate::storage::QueryBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    pub name: String,
    pub text: String,
}

/// Ordered queries sharing one complexity class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    pub complexity: Complexity,
    pub queries: Vec<NamedQuery>,
}

impl QuerySet {
    pub fn new(complexity: Complexity, entries: &[(&str, &str)]) -> Self {
        Self {
            complexity,
            queries: entries
                .iter()
                .map(|(name, text)| NamedQuery {
                    name: name.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|q| q.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// One timed query execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub query_name: String,
    pub complexity: Complexity,
    #[serde(rename = "db")]
    pub backend: String,
    pub time_sec: f64,
    pub rows: usize,
    pub preview: String,
}

/// A query that failed to execute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub query_name: String,
    pub complexity: Complexity,
    #[serde(rename = "db")]
    pub backend: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub records: Vec<MetricRecord>,
    pub failures: Vec<QueryFailure>,
}

impl BenchmarkReport {
    pub fn extend(&mut self, other: BenchmarkReport) {
        self.records.extend(other.records);
        self.failures.extend(other.failures);
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Default number of rows rendered into a preview
pub const DEFAULT_PREVIEW_ROWS: usize = 3;

/// Default maximum preview length in characters
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkRunner {
    preview_rows: usize,
    preview_chars: usize,
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl BenchmarkRunner {
    pub fn new(preview_rows: usize, preview_chars: usize) -> Self {
        Self {
            preview_rows,
            preview_chars,
        }
    }

    /// Run every query of `set` against `backend`, in order
    pub async fn run(&self, backend: &dyn QueryBackend, set: &QuerySet) -> BenchmarkReport {
        let mut report = BenchmarkReport::default();

        for query in &set.queries {
            match self.run_query(backend, set.complexity, query).await {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    warn!(
                        backend = backend.backend_name(),
                        query = %query.name,
                        error = %e,
                        "Benchmark query failed"
                    );
                    report.failures.push(QueryFailure {
                        query_name: query.name.clone(),
                        complexity: set.complexity,
                        backend: backend.backend_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Time a single query
    pub async fn run_query(
        &self,
        backend: &dyn QueryBackend,
        complexity: Complexity,
        query: &NamedQuery,
    ) -> Result<MetricRecord, StoreError> {
        let start = Instant::now();
        let rows = backend.run_query(&query.text).await?;
        let elapsed = start.elapsed();

        debug!(
            backend = backend.backend_name(),
            query = %query.name,
            rows = rows.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Benchmark query finished"
        );

        Ok(MetricRecord {
            query_name: query.name.clone(),
            complexity,
            backend: backend.backend_name().to_string(),
            time_sec: elapsed.as_secs_f64(),
            rows: rows.len(),
            preview: self.preview(&rows),
        })
    }

    /// JSON rendering of the first rows, cut at `preview_chars` characters
    pub fn preview(&self, rows: &[serde_json::Value]) -> String {
        let head = &rows[..rows.len().min(self.preview_rows)];
        let rendered = serde_json::to_string(head).unwrap_or_default();

        if rendered.chars().count() <= self.preview_chars {
            return rendered;
        }
        let mut cut: String = rendered.chars().take(self.preview_chars).collect();
        cut.push_str("...");
        cut
    }
}
