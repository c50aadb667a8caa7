use crate::cli::OutputFormat;
use crate::output;
use crate::stores::Stores;
use anyhow::{Context, Result};
use egonet_config::EgonetConfig;
use egonet_core::{BenchmarkReport, BenchmarkRunner, QuerySet};
use tracing::{info, warn};

/// The simple and complex sets of the backend named `backend`
fn query_sets(backend: &str) -> Vec<QuerySet> {
    match backend {
        "surrealdb" => vec![
            egonet_surrealdb::simple_queries(),
            egonet_surrealdb::complex_queries(),
        ],
        _ => vec![
            egonet_sqlite::simple_queries(),
            egonet_sqlite::complex_queries(),
        ],
    }
}

/// Run both query sets against every open store
pub async fn run_benchmarks(config: &EgonetConfig, stores: &Stores) -> BenchmarkReport {
    let runner = BenchmarkRunner::new(
        config.benchmark.preview_rows,
        config.benchmark.preview_chars,
    );

    let mut report = BenchmarkReport::default();
    for backend in stores.query_backends() {
        for set in query_sets(backend.backend_name()) {
            info!(
                backend = backend.backend_name(),
                complexity = set.complexity.as_str(),
                queries = set.len(),
                "Running query set"
            );
            report.extend(runner.run(backend, &set).await);
        }
    }

    if !report.is_success() {
        warn!(failed = report.failures.len(), "Some benchmark queries failed");
    }
    report
}

pub async fn execute(
    config: EgonetConfig,
    stores: &Stores,
    format: OutputFormat,
) -> Result<BenchmarkReport> {
    let report = run_benchmarks(&config, stores).await;
    let rendered = output::render_report(&report, format)?;

    match &config.benchmark.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), records = report.records.len(), "Wrote benchmark report");
        }
        None => println!("{rendered}"),
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Backend;
    use crate::commands::import::import_all;
    use egonet_core::test_support::write_fixture_dataset;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_report_covers_every_query_of_each_backend() {
        let data = TempDir::new().unwrap();
        let db = TempDir::new().unwrap();
        write_fixture_dataset(data.path()).unwrap();

        let mut config = EgonetConfig::default();
        config.dataset.dir = data.path().to_path_buf();
        config.relational.path = db.path().join("egonet.db");
        config.benchmark.output = Some(db.path().join("metrics.csv"));

        let stores = Stores::open(&config, Backend::Both).await.unwrap();
        import_all(&config, &stores).await.unwrap();
        let report = execute(config.clone(), &stores, OutputFormat::Csv)
            .await
            .unwrap();

        for backend in ["sqlite", "surrealdb"] {
            let ran = report
                .records
                .iter()
                .filter(|r| r.backend == backend)
                .count()
                + report.failures.iter().filter(|f| f.backend == backend).count();
            assert_eq!(ran, 10, "{backend}");
        }
        assert!(report
            .records
            .iter()
            .filter(|r| r.backend == "sqlite")
            .all(|r| r.time_sec >= 0.0));

        let written = std::fs::read_to_string(db.path().join("metrics.csv")).unwrap();
        assert!(written.starts_with("query_name,complexity,db,time_sec,rows,preview"));
    }
}
