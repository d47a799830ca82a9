//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case.

pub mod check;
pub mod logging;
pub mod runner;
pub mod syntax;

pub use check::{CheckReport, CheckResult, CheckService, CheckSummary};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use runner::{write_manual_instructions, MigrationRun, MigrationRunner};
pub use syntax::validate_sql_syntax;
