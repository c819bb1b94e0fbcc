//! Coffee Health Risk Service - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== Coffee Health Risk Service v{} ===", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server(settings).await {
        error!("{}", e);
        return Err(e.into());
    }

    Ok(())
}
