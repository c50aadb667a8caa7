use crate::output;
use crate::stores::{ImportTotals, Stores};
use anyhow::{Context, Result};
use egonet_config::EgonetConfig;
use egonet_core::{discover_ego_ids, load_ego_network, EgoNetworkFiles, StoreError};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of importing a whole data directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub networks: usize,
    /// Ego networks whose files could not be parsed
    pub skipped: Vec<String>,
    /// Ego networks a store failed to write; their chunks up to the failure stay committed
    pub failed: Vec<String>,
    pub totals: ImportTotals,
}

/// Import every ego network of the configured data directory into `stores`
///
/// Networks are parsed and written one at a time. A network whose files do
/// not parse, or whose write fails, is logged and skipped. Only a store that
/// is unreachable or has a broken schema aborts the import.
pub async fn import_all(config: &EgonetConfig, stores: &Stores) -> Result<ImportSummary> {
    let dir = &config.dataset.dir;
    let ego_ids = discover_ego_ids(dir)
        .with_context(|| format!("Failed to list ego networks in {}", dir.display()))?;

    if config.ingest.wipe_before_import {
        stores.wipe().await?;
    }

    info!(
        dir = %dir.display(),
        networks = ego_ids.len(),
        batch_size = config.ingest.batch_size,
        "Starting import"
    );

    let pb = ProgressBar::new(ego_ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} ego {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
    );

    let mut summary = ImportSummary::default();
    for ego_id in ego_ids {
        pb.set_message(ego_id.clone());

        let network = match load_ego_network(&EgoNetworkFiles::in_dir(dir, &ego_id)) {
            Ok(network) => network,
            Err(e) => {
                error!(ego_id = %ego_id, error = %e, "Skipping ego network that failed to parse");
                summary.skipped.push(ego_id);
                pb.inc(1);
                continue;
            }
        };

        match stores
            .ingest_into(Arc::new(network), &mut summary.totals)
            .await
        {
            Ok(()) => summary.networks += 1,
            Err(e) => record_store_failure(&mut summary, ego_id, e)?,
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        networks = summary.networks,
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "Import finished"
    );
    Ok(summary)
}

/// Skip the network on a write failure; stop the run when the store itself is gone
fn record_store_failure(summary: &mut ImportSummary, ego_id: String, err: StoreError) -> Result<()> {
    if err.is_fatal_to_run() {
        return Err(err).with_context(|| format!("Failed to import ego network {ego_id}"));
    }
    error!(ego_id = %ego_id, error = %err, "Skipping ego network that failed to write");
    summary.failed.push(ego_id);
    Ok(())
}

pub async fn execute(config: EgonetConfig, stores: &Stores) -> Result<ImportSummary> {
    let summary = import_all(&config, stores).await?;
    println!(
        "{}",
        output::render_import(
            &summary.totals,
            summary.networks,
            summary.skipped.len(),
            summary.failed.len(),
        )
    );
    Ok(summary)
}
