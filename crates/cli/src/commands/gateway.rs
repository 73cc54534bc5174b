//! `lectern gateway` — Start the HTTP chat server.

use std::path::Path;

use lectern_config::AppConfig;

pub async fn run(config_path: &Path, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load_from(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Lectern Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Catalog:   {}", config.catalog_path);

    lectern_gateway::start(config).await?;

    Ok(())
}
