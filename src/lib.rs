//! Promptforge - Character Prompt Generator
//!
//! Core library providing weighted-random attribute composition,
//! description-template rendering, and the REST API for generating
//! anime, alien, and adventurer image prompts.

pub mod config;
pub mod core;
pub mod database;
pub mod server;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
