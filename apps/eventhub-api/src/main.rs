use axum_helpers::server::{create_production_app, create_router, health_router};
use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::{RetryConfig, connect_with_retry};
use tracing::info;

mod api;
mod config;
mod openapi;
mod seed;
mod state;

use config::Config;
use state::AppState;

#[derive(Parser)]
#[command(name = "eventhub-api")]
#[command(about = "Event discovery API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Insert demo locations, organizers and events, then exit
    Seed {
        /// Password for the seeded organizer accounts
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        app = config.app.name,
        version = config.app.version,
        "Connecting to MongoDB at {}",
        config.mongodb.redacted_url()
    );
    let mongo_client = connect_with_retry(&config.mongodb, RetryConfig::default()).await?;
    let db = mongo_client.database(config.mongodb.database());
    info!("Connected to MongoDB database: {}", config.mongodb.database());

    api::init_indexes(&db).await?;

    let state = AppState {
        config,
        mongo_client,
        db,
    };

    let services = api::Services::from_state(&state)?;

    if let Some(Commands::Seed { password }) = cli.command {
        seed::run(&services.users, &services.locations, &services.events, &password).await?;
        return Ok(());
    }

    let api_routes = api::routes(&state, &services)?;
    let app = create_router::<openapi::ApiDoc>(api_routes, &state.config.router)?
        .merge(api::public_routes(&state, &services))
        .merge(health_router(state.config.app));

    info!("Starting EventHub API");

    let server = state.config.server.clone();
    create_production_app(app, &server, async move {
        info!("Shutting down: closing MongoDB connections");
        // The client closes its pool on drop
        drop(state.mongo_client);
        info!("MongoDB connection closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("EventHub API shutdown complete");
    Ok(())
}
