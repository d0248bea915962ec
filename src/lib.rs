//! # Notice Relay Library
//!
//! Accepts notification requests over HTTP, exchanges shared credentials
//! for a short-lived upstream access token, caches it, and forwards the
//! notification to the upstream messaging API.
//!
//! Modules:
//! - `config` — service configuration, loading and validation
//! - `cache` — access token cache with double-checked refresh
//! - `sources` — upstream token exchange
//! - `notice` — inbound notice validation and upstream dispatch
//! - `parser` — upstream response decoding and URL templates
//! - `server` — HTTP routes

pub mod config;
pub mod cache;
pub mod errors;
pub mod sources;
pub mod notice;
pub mod parser;
pub mod tests;
pub mod observability;
pub mod server;
pub mod helpers;
pub mod utils;


pub use crate::config::settings::ServiceConfig;
pub use crate::cache::token_cache::TokenCache;
pub use crate::notice::dispatcher::{NoticeDispatcher, NoticeOutcome};
