//! Migrate command - applies or reverts the account schema

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{self, account_migrations, PostgresMigrator};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the latest applied migration instead
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    let url = config
        .database
        .url
        .as_deref()
        .context("database.url is not set (APP__DATABASE__URL)")?;

    let pool = storage::connect(url, &config.database).await?;

    if args.revert {
        let migrator = PostgresMigrator::new(pool);
        let Some(version) = migrator.current_version().await? else {
            info!("No migration to revert");
            return Ok(());
        };

        let migration = account_migrations()
            .into_iter()
            .find(|m| m.version == version)
            .with_context(|| format!("Unknown migration version {}", version))?;

        migrator.revert_migration(&migration).await?;
        return Ok(());
    }

    let applied = storage::run_migrations(&pool).await?;
    info!(applied, "Migrations complete");

    Ok(())
}
