//! Log database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary with include_str! and applied
//! in order. Each entry is (filename, sql_content).

/// All log migrations, embedded at compile time.
///
/// When adding a migration, create `NNN_description.sql` and append an
/// entry here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
