//! Tail Command
//!
//! Follows one topic, printing every delivered message until Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use livefeed_core::{CallbackSubscriber, Message, Subscription, Topic};
use tracing::debug;

use crate::config::CliConfig;
use crate::display;

fn print_frame(message: &Message) {
    match message.to_frame() {
        Ok(frame) => println!("{}", frame),
        Err(e) => display::error(&format!("Failed to encode message: {}", e)),
    }
}

/// Follows a topic until interrupted.
pub async fn run(config: &CliConfig, topic: Topic, json: bool) -> Result<()> {
    let feed = config.open_feed()?;

    let on_message: fn(&Message) = if json {
        print_frame
    } else {
        display::message
    };
    let subscriber = CallbackSubscriber::new(on_message)
        .on_state_change(display::state)
        .on_error(|err| display::warning(&err.to_string()));

    if !json {
        display::info(&format!(
            "Following '{}' at {} (Ctrl-C to stop)",
            topic, config.api_url
        ));
    }

    let manager = feed
        .subscribe(Subscription::new(topic, Arc::new(subscriber)))
        .await?;
    debug!(url = %manager.url(), "subscribed");

    tokio::signal::ctrl_c().await?;
    manager.disconnect().await?;

    if !json {
        display::success("Stopped");
    }
    Ok(())
}
