use std::sync::Arc;

use anyhow::Context;
use catchkeeper::{
    catalog::{CatalogPort, PokeApiCatalog},
    cli::config_path_from_args,
    config::Config,
    logging::init_tracing,
    roster::{InMemoryRosterStore, RosterPersistence, RosterService},
    server::{self, ServerContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let persistence = RosterPersistence::new(config.roster.state_path.clone());
    let store = InMemoryRosterStore::open(persistence).context("failed to open roster state")?;
    let catalog: Arc<dyn CatalogPort> =
        Arc::new(PokeApiCatalog::new(&config.catalog).context("failed to build catalog client")?);
    let roster = RosterService::with_defaults(Arc::new(store), Arc::clone(&catalog));

    tracing::info!(
        target: "catchkeeper",
        run_id = logging_guard.run_id(),
        config_path = %config_path.display(),
        "catchkeeper_starting"
    );

    let context = Arc::new(ServerContext {
        roster: Arc::new(roster),
        catalog,
    });
    server::run(&config.server, context).await?;

    drop(logging_guard);
    Ok(())
}
