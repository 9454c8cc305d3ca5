//! Gist tracking service
//!
//! - Keeps an in-memory list of GitHub users in `registry/`
//! - `poller` files every new gist of those users as a Pipedrive activity
//! - REST API endpoints in `endpoints/`
//! - Requires PIPEDRIVE_TOKEN env var, see `config` for the rest

pub mod config;
pub mod endpoints;
pub mod poller;
pub mod registry;
pub mod snapshot;
pub mod state;
pub mod upstream;
pub mod utils;
