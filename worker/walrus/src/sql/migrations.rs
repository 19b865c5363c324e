use crate::errors::Error;
use diesel::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Create the `realtime` schema and apply pending embedded migrations
pub fn run_migrations(conn: &mut PgConnection) -> Result<(), Error> {
    let setup_error = |x: diesel::result::Error| Error::PostgresConnectionError(format!("{}", x));

    sql_query("create schema if not exists realtime")
        .execute(conn)
        .map_err(setup_error)?;
    // __diesel_schema_migrations lives next to the realtime objects
    sql_query("set search_path='realtime'")
        .execute(conn)
        .map_err(setup_error)?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|x| Error::PostgresConnectionError(format!("Migrations failed: {}", x)))?;

    for version in applied {
        info!("Applied migration {}", version);
    }
    Ok(())
}
