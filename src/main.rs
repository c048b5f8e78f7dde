use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use req_tracker::Config;
use req_tracker::server::{bootstrap, tracker_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(true),
        )
        .init();

    info!(
        database_url = %cfg.database.url,
        environment = ?cfg.basic.environment,
        loglevel = %cfg.basic.loglevel,
        cors_origins = ?cfg.basic.cors_origins,
    );

    if cfg.is_production() && cfg.uses_default_secret() {
        warn!("JWT secret is the built-in default; set JWT_SECRET in production");
    }

    let state = bootstrap(&cfg).await?;
    let store = state.store.clone();
    let app = tracker_router(state, &cfg.basic.cors_origins);

    let addr = cfg.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}
