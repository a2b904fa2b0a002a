//! Log database migrations, embedded at compile time
//!
//! Each entry is `(file name, sql)`. `000_migrations.sql` bootstraps the
//! bookkeeping table and is applied first; the rest run in listed order.

/// Add new files as `NNN_description.sql` and append them here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
