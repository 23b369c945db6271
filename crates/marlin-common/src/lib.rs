//! Shared utilities for the Marlin document engine.
//!
//! This crate carries the concerns every other Marlin crate leans on:
//!
//! - [`net`] — the [`net::ResourceProvider`] capability plus the production
//!   HTTP implementation and a deterministic in-memory one for tests.
//! - [`url`] — simplified relative-URL resolution.
//! - [`warning`] — deduplicated, colored warnings for recoverable problems.

pub mod net;
pub mod url;
pub mod warning;
