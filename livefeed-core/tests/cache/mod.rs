// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the conditional response cache
//!
//! Store behaviour on disk and in memory, and conditional fetches against a
//! fake HTTP server.

mod conditional_tests;
mod store_tests;
