//! This module defines the command-line interface structure and handlers.

/// Top-level argument structs and the command dispatcher.
pub mod commands;
/// Console output formatting for query results.
pub mod formatters;

// Per-command handler modules
/// Handler for the `clear` command.
pub mod clear;
/// Handler for the `index` command.
pub mod index;
/// Handler for the `query` command.
pub mod query;
/// Handler for the `stats` command.
pub mod stats;

// Re-export the main handler and the argument structs for the binary
pub use commands::{handle_command, CliArgs, Commands, LogFormat};
pub use index::IndexArgs;
pub use query::QueryArgs;
