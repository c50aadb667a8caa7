use crate::stores::Stores;
use anyhow::Result;

pub async fn execute(stores: &Stores) -> Result<()> {
    stores.wipe().await?;
    let mut names = Vec::new();
    if stores.graph.is_some() {
        names.push("surrealdb");
    }
    if stores.relational.is_some() {
        names.push("sqlite");
    }
    println!("Wiped {}", names.join(" and "));
    Ok(())
}
