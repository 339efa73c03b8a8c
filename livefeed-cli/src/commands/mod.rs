//! CLI Commands

pub mod cache;
pub mod fetch;
pub mod tail;
pub mod topics;
