//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod map;
mod plan;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use map::handle_map;
pub use plan::handle_plan;
