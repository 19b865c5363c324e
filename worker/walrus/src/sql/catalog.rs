//! Catalog lookups backing `Catalog` on `PgBackend`.
//!
//! Each is memoised for a second so a batch touching the same table many
//! times costs one round trip per table, role and publication.

use crate::errors::Error;
use crate::models::realtime::{self, Entity};
use cached::proc_macro::cached;
use cached::TimedSizedCache;
use diesel::*;

mod functions {
    use diesel::sql_types::*;
    use diesel::*;

    sql_function! {
        #[sql_name = "realtime.selectable_columns"]
        fn selectable_columns(schema_name: Text, table_name: Text, role_name: Text) -> Array<Jsonb>;
    }

    sql_function! {
        #[sql_name = "realtime.is_rls_enabled"]
        fn is_rls_enabled(schema_name: Text, table_name: Text) -> Bool;
    }

    sql_function! {
        #[sql_name = "realtime.is_in_publication"]
        fn is_in_publication(schema_name: Text, table_name: Text, publication_name: Text) -> Bool;
    }

    sql_function! {
        #[sql_name = "realtime.publication_actions"]
        fn publication_actions(publication_name: Text) -> Array<Text>;
    }

    sql_function! {
        #[sql_name = "realtime.get_table_oid"]
        fn get_table_oid(schema_name: Text, table_name: Text) -> Oid;
    }
}

fn sql_error(err: diesel::result::Error) -> Error {
    Error::SQLFunction(format!("{}", err))
}

#[cached(
    type = "TimedSizedCache<String, Result<Vec<realtime::Column>, Error>>",
    create = "{ TimedSizedCache::with_size_and_lifespan(500, 1) }",
    convert = r#"{ format!("{}-{}", entity, role) }"#,
    sync_writes = true
)]
pub fn selectable_columns(
    entity: &Entity,
    role: &str,
    conn: &mut PgConnection,
) -> Result<Vec<realtime::Column>, Error> {
    let columns: Vec<serde_json::Value> =
        select(functions::selectable_columns(&entity.schema, &entity.table, role))
            .first(conn)
            .map_err(sql_error)?;

    columns
        .into_iter()
        .map(|x| {
            serde_json::from_value(x).map_err(|err| {
                Error::SQLFunction(format!("Unexpected column from {}: {}", entity, err))
            })
        })
        .collect()
}

#[cached(
    type = "TimedSizedCache<String, Result<bool, Error>>",
    create = "{ TimedSizedCache::with_size_and_lifespan(250, 1) }",
    convert = r#"{ entity.to_string() }"#,
    sync_writes = true
)]
pub fn is_rls_enabled(entity: &Entity, conn: &mut PgConnection) -> Result<bool, Error> {
    select(functions::is_rls_enabled(&entity.schema, &entity.table))
        .first(conn)
        .map_err(sql_error)
}

#[cached(
    type = "TimedSizedCache<String, Result<bool, Error>>",
    create = "{ TimedSizedCache::with_size_and_lifespan(250, 1) }",
    convert = r#"{ format!("{}-{}", entity, publication) }"#,
    sync_writes = true
)]
pub fn is_in_publication(
    entity: &Entity,
    publication: &str,
    conn: &mut PgConnection,
) -> Result<bool, Error> {
    select(functions::is_in_publication(
        &entity.schema,
        &entity.table,
        publication,
    ))
    .first(conn)
    .map_err(sql_error)
}

/// wal2json `actions` option from the publication's insert/update/delete
/// flags, e.g. "insert,update"
#[cached(
    type = "TimedSizedCache<String, Result<String, Error>>",
    create = "{ TimedSizedCache::with_size_and_lifespan(50, 1) }",
    convert = r#"{ publication.to_string() }"#,
    sync_writes = true
)]
pub fn publication_actions(publication: &str, conn: &mut PgConnection) -> Result<String, Error> {
    let actions: Vec<String> = select(functions::publication_actions(publication))
        .first(conn)
        .map_err(sql_error)?;

    if actions.is_empty() {
        return Err(Error::Walrus(format!(
            "Publication {} does not publish inserts, updates or deletes",
            publication
        )));
    }
    Ok(actions.join(","))
}

#[cached(
    type = "TimedSizedCache<String, Result<u32, Error>>",
    create = "{ TimedSizedCache::with_size_and_lifespan(10000, 1) }",
    convert = r#"{ entity.to_string() }"#,
    sync_writes = true
)]
pub fn get_table_oid(entity: &Entity, conn: &mut PgConnection) -> Result<u32, Error> {
    select(functions::get_table_oid(&entity.schema, &entity.table))
        .first(conn)
        .map_err(sql_error)
}
