use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::AppConfig;
use crate::ews;
use crate::graph::{GraphClient, GraphSettings, TokenCache};

pub async fn run(file: &Path, decode_only: bool) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let query = ews::decode(&raw)?;

    if decode_only {
        println!("{}", serde_json::to_string_pretty(&query)?);
        return Ok(());
    }

    let config = AppConfig::default();
    let graph = GraphClient::new(
        GraphSettings::from_config(&config),
        Arc::new(TokenCache::new()),
    )?;
    let schedules = graph.fetch(&query).await?;
    let xml = ews::encode(&schedules)?;
    println!("{}", String::from_utf8_lossy(&xml));

    Ok(())
}
