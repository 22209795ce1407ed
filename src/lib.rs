//! heroapps - a terminal storefront for a REST app catalog
//!
//! This library exposes the screen state, store and client for use by the
//! TUI, the debug CLI and tests.

pub mod catalog;
pub mod client;
pub mod config;
pub mod details;
pub mod installed;
pub mod store;
pub mod types;
pub mod worker;
