//! Terminal client for the ThinkingNews API.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so integration tests can drive the feed, storage and
//! syndication layers directly.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod keybindings;
pub mod storage;
pub mod syndication;
pub mod theme;
pub mod ui;
pub mod util;
