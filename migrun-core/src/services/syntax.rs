//! SQL syntax checking for migration files

use anyhow::{anyhow, Result};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Parse `sql` as PostgreSQL and return the statement count
///
/// The parser doesn't know every Supabase extension, so callers treat a
/// failure as a warning rather than a reason to skip the push.
pub fn validate_sql_syntax(sql: &str) -> Result<usize> {
    let dialect = PostgreSqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql).map_err(|e| {
        let msg = e.to_string();
        let cleaned = msg.trim_start_matches("sql parser error: ");
        anyhow!("{}", cleaned)
    })?;
    Ok(statements.len())
}
