// Pokédex Gallery - Web Server
// HTML gallery and REST API with Axum

use anyhow::{Context, Result};
use pokedex_gallery::server::{router, spawn_load, AppState};
use pokedex_gallery::{telemetry, GalleryConfig, Loader, Session};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("info");

    println!("🌐 Pokédex Gallery - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = GalleryConfig::resolve()?;
    let loader = Loader::from_config(&config)?;
    let addr = config.server_addr.clone();

    // Create shared state; the catalog loads in the background
    let state = AppState::new(Session::new(), loader, config);
    spawn_load(state.clone());

    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/creatures", addr);
    println!("   UI:  http://{}", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
