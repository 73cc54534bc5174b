//! `lectern catalog` — List the configured courses and their namespaces.

use std::path::Path;

use lectern_config::AppConfig;
use lectern_core::CourseCatalog;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_from(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = CourseCatalog::from_json_file(&config.catalog_path)?;

    if catalog.is_empty() {
        println!("Catalog is empty: {}", config.catalog_path);
        return Ok(());
    }

    for course in catalog.courses() {
        println!("{course}");
        if let Some(namespaces) = catalog.namespaces_for(course) {
            for namespace in namespaces {
                println!("  - {namespace}");
            }
        }
    }

    Ok(())
}
