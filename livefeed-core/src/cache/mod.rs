// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conditional response cache
//!
//! Keeps the last payload and version tag of each polled resource so that
//! repeat polls can be answered with `304 Not Modified` instead of a full
//! body. The backing store is injected; [`FileCacheStore`] survives process
//! restarts, [`MemoryCacheStore`] is for tests and ephemeral use.
//!
//! Entries never expire on their own: a stored entry is replaced only by a
//! newer successful fetch for the same key.

mod conditional;
mod store;
mod types;

pub use conditional::{ConditionalCache, FetchError, Fetched};
pub use store::{CacheError, CacheStore, FileCacheStore, MemoryCacheStore};
pub use types::CacheEntry;
