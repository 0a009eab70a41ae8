mod balance;
mod error;
mod home;
mod inflows;
mod render;
mod router;
mod state;

use std::sync::Arc;

use router::router;
use state::ServerState;
use treasury_core::config::Config;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt::init();

    let state = Arc::new(ServerState::from(config.export_dir.clone()));
    log::info!(
        "Serving dashboard data from {} on {}",
        state.data_dir().display(),
        config.server_domain
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.server_domain).await?;

    axum::serve(listener, app).await?;
    Ok(())
}
