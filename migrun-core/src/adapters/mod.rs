//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - The Supabase CLI run as a child process for DatabaseCli
//! - A scripted DatabaseCli for tests
//! - The Supabase REST endpoint for applying SQL over RPC

pub mod rpc;
pub mod scripted;
pub mod supabase_cli;
