//! Topics Command

use anyhow::Result;
use console::style;
use livefeed_core::Topic;

use crate::config::CliConfig;

/// Lists every topic with its channel and polling URLs.
pub fn list(config: &CliConfig) -> Result<()> {
    let feed_config = config.feed_config();

    println!("Topics:");
    println!();
    for topic in Topic::ALL {
        let resource = topic.poll_resource();
        println!("  {}", style(topic).bold().cyan());
        println!("    Live:  {}", feed_config.channel_url(topic)?);
        println!(
            "    Poll:  {} (cache key: {})",
            feed_config.resource_url(resource.path)?,
            resource.key
        );
    }

    Ok(())
}
