//! Client-side core of the event discovery app: an expiring embed cache,
//! typeahead select controls and the session token store.

pub mod app;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod embed_cache;
pub mod json;
pub mod logging;
pub mod select;
pub mod store;
pub mod utils;
pub mod warnings;
