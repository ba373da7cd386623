//! Settings come from a TOML file plus `KOST__*` environment overrides.
//! See `bin/settings_demo.rs` for a binary that loads and prints them.

mod cli;
pub use clap::{Parser, Subcommand};
pub use cli::*;

mod settings;
pub use settings::*;
