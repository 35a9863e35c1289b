use clap::Parser;
use roster_moment::config::{AppConfig, setup_logging};
use roster_moment::web::AppState;
use sea_orm_migration::MigratorTrait;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = roster_moment::cli::CliOptions::parse();

    if let Err(err) = setup_logging(cli.debug) {
        eprintln!("Failed to set up logging: {}", err);
        return;
    }

    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {}", err);
            return;
        }
    };

    let db = match roster_moment::db::connect_db(&cli.database_path).await {
        Ok(db) => db,
        Err(err) => {
            error!("Database connection error: {}", err);
            return;
        }
    };

    if let Err(err) = roster_moment::db::migrations::Migrator::up(&db, None).await {
        error!("Database migration error: {}", err);
        return;
    }

    let state = match AppState::new(config, db) {
        Ok(state) => state,
        Err(err) => {
            error!("Failed to build application state: {}", err);
            return;
        }
    };

    if let Err(err) =
        roster_moment::web::setup_server(&cli.listen_address, cli.port, state).await
    {
        error!("Application error: {}", err);
    }
}
