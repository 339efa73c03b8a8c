//! Fetch Command
//!
//! One conditional fetch of a topic's resource, printed as JSON.

use anyhow::Result;
use livefeed_core::Topic;

use crate::config::CliConfig;

/// Fetches a topic's resource once and prints it.
pub async fn run(config: &CliConfig, topic: Topic) -> Result<()> {
    let feed = config.open_feed()?;
    let payload = feed.fetch(topic).await?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
