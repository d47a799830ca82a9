//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The runner
//! depends only on these traits, not on concrete implementations.

mod database_cli;

pub use database_cli::{DatabaseCli, PushOutput};
