//! Cache Commands
//!
//! Inspect and clear the on-disk response cache.

use anyhow::{anyhow, Result};
use livefeed_core::CacheStore;

use crate::config::CliConfig;
use crate::display;

/// Lists cached resources.
pub fn list(config: &CliConfig) -> Result<()> {
    let store = config.open_store()?;
    let keys = store.keys()?;

    if keys.is_empty() {
        display::info("Cache is empty. Run 'livefeed fetch <topic>' to populate it.");
        return Ok(());
    }

    println!("Cached resources ({}):", store.dir().display());
    println!();
    for key in keys {
        match store.get(&key) {
            Ok(Some(entry)) => println!(
                "  {:20} {:24} stored {}",
                entry.key,
                entry.version_tag,
                entry.stored_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Ok(None) => {}
            Err(e) => display::warning(&format!("{}: unreadable ({})", key, e)),
        }
    }

    Ok(())
}

/// Prints one cached resource.
pub fn show(config: &CliConfig, key: &str) -> Result<()> {
    let store = config.open_store()?;
    let entry = store
        .get(key)?
        .ok_or_else(|| anyhow!("Nothing cached for '{}'", key))?;

    println!("Key: {}", entry.key);
    println!("Version: {}", entry.version_tag);
    println!("Stored: {}", entry.stored_at.to_rfc3339());
    println!();
    println!("{}", serde_json::to_string_pretty(&entry.payload)?);

    Ok(())
}

/// Removes one cached resource, or all of them.
pub fn clear(config: &CliConfig, key: Option<&str>) -> Result<()> {
    let store = config.open_store()?;
    let keys = match key {
        Some(key) => vec![key.to_string()],
        None => store.keys()?,
    };

    for key in &keys {
        store.remove(key)?;
    }

    display::success(&format!("Removed {} cached resource(s)", keys.len()));
    Ok(())
}
