//! Rendering of benchmark reports, import totals and entity counts

use crate::cli::OutputFormat;
use crate::stores::ImportTotals;
use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use egonet_core::{BenchmarkReport, IngestStats};
use serde_json::json;
use std::collections::BTreeMap;

/// Column order of the metrics export
pub const METRIC_COLUMNS: [&str; 6] = ["query_name", "complexity", "db", "time_sec", "rows", "preview"];

fn header(table: &mut Table, columns: &[&str]) {
    table
        .load_preset(UTF8_FULL)
        .set_header(columns.iter().map(|c| Cell::new(c).fg(Color::Cyan)));
}

pub fn render_report(report: &BenchmarkReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(report_table(report)),
        OutputFormat::Csv => report_csv(report),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize report")
        }
    }
}

fn report_table(report: &BenchmarkReport) -> String {
    let mut table = Table::new();
    header(&mut table, &METRIC_COLUMNS);
    for record in &report.records {
        table.add_row(vec![
            Cell::new(&record.query_name),
            Cell::new(record.complexity.as_str()),
            Cell::new(&record.backend),
            Cell::new(format!("{:.6}", record.time_sec)),
            Cell::new(record.rows),
            Cell::new(&record.preview),
        ]);
    }

    let mut out = table.to_string();
    if !report.failures.is_empty() {
        let mut failures = Table::new();
        header(&mut failures, &["query_name", "complexity", "db", "error"]);
        for failure in &report.failures {
            failures.add_row(vec![
                Cell::new(&failure.query_name),
                Cell::new(failure.complexity.as_str()),
                Cell::new(&failure.backend),
                Cell::new(&failure.error).fg(Color::Red),
            ]);
        }
        out.push_str("\n\nFailed queries\n");
        out.push_str(&failures.to_string());
    }
    out
}

fn report_csv(report: &BenchmarkReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in &report.records {
        writer
            .serialize(record)
            .context("Failed to write metrics row")?;
    }
    if report.records.is_empty() {
        writer.write_record(METRIC_COLUMNS)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush metrics: {}", e))?;
    String::from_utf8(bytes).context("Metrics are not valid UTF-8")
}

const STAT_COLUMNS: [&str; 9] = [
    "db",
    "users",
    "circles",
    "feature_groups",
    "features",
    "feature_assignments",
    "follows",
    "memberships",
    "chunks",
];

fn stats_row(backend: &str, stats: &IngestStats) -> Vec<Cell> {
    vec![
        Cell::new(backend),
        Cell::new(stats.users),
        Cell::new(stats.circles),
        Cell::new(stats.feature_groups),
        Cell::new(stats.features),
        Cell::new(stats.feature_assignments),
        Cell::new(stats.follows),
        Cell::new(stats.memberships),
        Cell::new(stats.chunks),
    ]
}

pub fn render_import(
    totals: &ImportTotals,
    networks: usize,
    skipped: usize,
    failed: usize,
) -> String {
    let mut table = Table::new();
    header(&mut table, &STAT_COLUMNS);
    if let Some(stats) = &totals.graph {
        table.add_row(stats_row("surrealdb", stats));
    }
    if let Some(stats) = &totals.relational {
        table.add_row(stats_row("sqlite", stats));
    }

    let mut out = format!("Imported {networks} ego network(s)");
    if skipped > 0 {
        out.push_str(&format!(", skipped {skipped} unparseable"));
    }
    if failed > 0 {
        out.push_str(&format!(", {failed} failed to write"));
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out
}

pub fn render_counts(
    counts: &BTreeMap<&'static str, BTreeMap<String, u64>>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            header(&mut table, &["db", "table", "count"]);
            for (backend, tables) in counts {
                for (name, count) in tables {
                    table.add_row(vec![Cell::new(backend), Cell::new(name), Cell::new(count)]);
                }
            }
            Ok(table.to_string())
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(["db", "table", "count"])?;
            for (backend, tables) in counts {
                for (name, count) in tables {
                    writer.write_record([*backend, name.as_str(), count.to_string().as_str()])?;
                }
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("Failed to flush counts: {}", e))?;
            String::from_utf8(bytes).context("Counts are not valid UTF-8")
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&json!(counts)).context("Failed to serialize counts")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egonet_core::{Complexity, MetricRecord, QueryFailure};

    fn report() -> BenchmarkReport {
        BenchmarkReport {
            records: vec![MetricRecord {
                query_name: "S2_users_per_ego".into(),
                complexity: Complexity::Simple,
                backend: "sqlite".into(),
                time_sec: 0.25,
                rows: 1,
                preview: r#"[{"ego_id":"100","user_count":3}]"#.into(),
            }],
            failures: vec![QueryFailure {
                query_name: "C4_mutual_follows".into(),
                complexity: Complexity::Complex,
                backend: "surrealdb".into(),
                error: "Query error: boom".into(),
            }],
        }
    }

    #[test]
    fn test_csv_has_fixed_header_and_quotes_previews() {
        let csv = render_report(&report(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("query_name,complexity,db,time_sec,rows,preview"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("S2_users_per_ego,simple,sqlite,0.25,1,"));
        assert!(row.contains(r#""[{""ego_id"":""100"","#));
    }

    #[test]
    fn test_empty_csv_still_has_header() {
        let csv = render_report(&BenchmarkReport::default(), OutputFormat::Csv).unwrap();
        assert_eq!(csv.trim(), METRIC_COLUMNS.join(","));
    }

    #[test]
    fn test_json_keeps_db_field_name() {
        let json = render_report(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["records"][0]["db"], "sqlite");
        assert_eq!(value["failures"][0]["query_name"], "C4_mutual_follows");
    }

    #[test]
    fn test_table_lists_failures() {
        let table = render_report(&report(), OutputFormat::Table).unwrap();
        assert!(table.contains("S2_users_per_ego"));
        assert!(table.contains("Failed queries"));
    }

    #[test]
    fn test_counts_csv() {
        let mut counts = BTreeMap::new();
        counts.insert("sqlite", BTreeMap::from([("edge".to_string(), 2u64)]));
        let csv = render_counts(&counts, OutputFormat::Csv).unwrap();
        assert_eq!(csv, "db,table,count\nsqlite,edge,2\n");
    }

    #[test]
    fn test_import_summary_names_skipped_and_failed() {
        let totals = ImportTotals {
            graph: None,
            relational: Some(egonet_core::IngestStats {
                users: 3,
                ..Default::default()
            }),
        };
        let text = render_import(&totals, 2, 1, 1);
        assert!(text.starts_with("Imported 2 ego network(s), skipped 1 unparseable, 1 failed to write\n"));
        assert!(text.contains("sqlite"));

        assert!(render_import(&totals, 2, 0, 0).starts_with("Imported 2 ego network(s)\n"));
    }
}
