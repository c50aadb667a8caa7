use anyhow::Result;
use clap::Parser;
use tracing::debug;

use egonet_cli::{
    cli::{Cli, Commands, ConfigCommands},
    commands, config, logging,
    stores::Stores,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Writing the example file must work even when the current one is broken
    if let Commands::Config(ConfigCommands::Init { path, force }) = &cli.command {
        logging::init(logging::resolve_level(&cli, "info"));
        return commands::config::execute(
            ConfigCommands::Init {
                path: path.clone(),
                force: *force,
            },
            &Default::default(),
        );
    }

    let mut overrides = config::CliOverrides::from_cli(&cli);
    match &cli.command {
        Commands::Import { import } | Commands::Run { import, .. } => {
            overrides.batch_size = import.batch_size;
            overrides.wipe = import.wipe;
        }
        _ => {}
    }
    match &cli.command {
        Commands::Bench { bench, .. } | Commands::Run { bench, .. } => {
            overrides.output = bench.output.clone();
        }
        _ => {}
    }

    let config = config::load(&cli, &overrides)?;
    logging::init(logging::resolve_level(&cli, &config.logging.level));
    debug!(?config, "Effective configuration");

    match cli.command {
        Commands::Import { import } => {
            let stores = Stores::open(&config, import.backend).await?;
            commands::import::execute(config, &stores).await?;
            stores.close()?;
        }

        Commands::Bench { backend, bench } => {
            let stores = Stores::open(&config, backend).await?;
            commands::bench::execute(config, &stores, bench.format).await?;
            stores.close()?;
        }

        Commands::Run { import, bench } => {
            let stores = Stores::open(&config, import.backend).await?;
            commands::import::import_all(&config, &stores).await?;
            commands::bench::execute(config, &stores, bench.format).await?;
            stores.close()?;
        }

        Commands::Wipe { backend } => {
            let stores = Stores::open(&config, backend).await?;
            commands::wipe::execute(&stores).await?;
            stores.close()?;
        }

        Commands::Stats { backend, format } => {
            let stores = Stores::open(&config, backend).await?;
            commands::stats::execute(&stores, format).await?;
            stores.close()?;
        }

        Commands::Config(cmd) => commands::config::execute(cmd, &config)?,
    }

    Ok(())
}
