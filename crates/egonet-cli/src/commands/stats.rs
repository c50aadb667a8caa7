use crate::cli::OutputFormat;
use crate::output;
use crate::stores::Stores;
use anyhow::Result;

pub async fn execute(stores: &Stores, format: OutputFormat) -> Result<()> {
    let counts = stores.entity_counts().await?;
    println!("{}", output::render_counts(&counts, format)?);
    Ok(())
}
