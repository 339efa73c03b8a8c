//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::style;
use livefeed_core::{ConnectionState, Message, MessageType};

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Prints a connection state change.
pub fn state(state: ConnectionState) {
    let label = match state {
        ConnectionState::Connected => style(state.as_str()).green(),
        ConnectionState::Connecting => style(state.as_str()).yellow(),
        ConnectionState::Disconnected => style(state.as_str()).dim(),
        ConnectionState::Failed => style(state.as_str()).red(),
    };
    eprintln!("{} {}", style("●").bold(), label);
}

/// Prints a delivered message on one line.
pub fn message(message: &Message) {
    let time = message.timestamp.format("%H:%M:%S");
    let kind = match message.kind {
        MessageType::Alert | MessageType::Error => style(message.kind.as_str()).red().bold(),
        MessageType::Heartbeat => style(message.kind.as_str()).dim(),
        _ => style(message.kind.as_str()).cyan(),
    };
    let body = message
        .alert
        .as_ref()
        .or(message.payload.as_ref())
        .map(|v| v.to_string())
        .unwrap_or_default();
    println!("{} {:20} {}", style(time).dim(), kind, body);
}
