//! Terminal User Interface module.
//!
//! This module provides the TUI for the news client, including:
//! - Main event loop (`run`)
//! - Input handling for the feed, detail, bookmarks and search modes
//! - Rendering for each view and the overlays
//! - Background task event processing
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - View rendering dispatch and overlays
//! - `helpers` - Task spawning and shared utility functions
//! - `feed` - Filter bar, trending section and article list
//! - `detail` - Article detail widget
//! - `bookmarks` - Saved articles list
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay

mod bookmarks;
mod detail;
mod events;
mod feed;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;

// Re-export the public API
pub use helpers::spawn_initial_loads;
pub use loop_runner::{run, Action};
