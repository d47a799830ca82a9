//! Core domain entities
//!
//! Pure data structures describing a migration and how its run ended.

mod outcome;
mod request;
pub mod result;

pub use outcome::MigrationOutcome;
pub use request::MigrationRequest;
