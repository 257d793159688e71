use std::time::Duration;

use anyhow::Result;
use sitesensor_config::Config;
use sitesensor_core::ChildType;
use sitesensor_core::child_types::{default_child_types, parse_catalog};

pub async fn handle(config: &Config, format: &str) -> Result<()> {
    let catalog = load_catalog(config).await;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        _ => {
            println!("Child types:");
            for child in &catalog {
                println!("  {:<24} {}", child.name, child.type_urn);
            }
        }
    }

    Ok(())
}

/// Fetch the configured catalog, falling back to the built-in types
pub async fn load_catalog(config: &Config) -> Vec<ChildType> {
    let Some(endpoint) = config.child_types.endpoint.as_deref() else {
        return default_child_types();
    };

    match fetch_catalog(endpoint).await {
        Ok(catalog) if !catalog.is_empty() => catalog,
        Ok(_) => {
            tracing::warn!(endpoint, "child type catalog is empty, using built-in types");
            default_child_types()
        }
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "child type catalog unavailable, using built-in types");
            default_child_types()
        }
    }
}

async fn fetch_catalog(endpoint: &str) -> Result<Vec<ChildType>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("sitesensor/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?;

    let response = client.get(endpoint).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP error {}: {}", response.status().as_u16(), endpoint);
    }

    let body = response.text().await?;
    Ok(parse_catalog(&body)?)
}
