use crate::errors::Error;
use crate::models::realtime::{role_from_claims, Entity, Subscription, UserDefinedFilter};
use crate::sql::catalog;
use crate::sql::postgres::PgBackend;
use crate::sql::schema::realtime::subscription;
use crate::validation;
use diesel::*;
use log::info;
use serde_json::Value;

#[derive(Insertable)]
#[diesel(table_name = subscription)]
struct NewSubscription<'a> {
    subscription_id: uuid::Uuid,
    entity: u32,
    filters: Vec<UserDefinedFilter>,
    claims: &'a Value,
    schema_name: &'a str,
    table_name: &'a str,
}

fn claims_role(claims: &Value) -> Result<&str, Error> {
    role_from_claims(claims)
        .ok_or_else(|| Error::Validation("claims must contain a role".to_string()))
}

pub fn create_subscription(
    backend: &mut PgBackend,
    subscription_id: uuid::Uuid,
    entity: &Entity,
    claims: &Value,
    filters: Vec<UserDefinedFilter>,
) -> Result<Subscription, Error> {
    let role = claims_role(claims)?;
    let filters = validation::validate_filters(backend, entity, role, filters)?;
    let oid = catalog::get_table_oid(entity, backend.connection())?;

    let new = NewSubscription {
        subscription_id,
        entity: oid,
        filters,
        claims,
        schema_name: &entity.schema,
        table_name: &entity.table,
    };

    let sub = insert_into(subscription::table)
        .values(&new)
        .get_result::<Subscription>(backend.connection())
        .map_err(|x| Error::Subscriptions(format!("{}", x)))?;

    info!("Created subscription {} on {}", sub.subscription_id, entity);
    Ok(sub)
}

/// Replace the filters of subscription row `id`, re-running validation
pub fn update_subscription_filters(
    backend: &mut PgBackend,
    id: i64,
    filters: Vec<UserDefinedFilter>,
) -> Result<Subscription, Error> {
    let existing = subscription::table
        .filter(subscription::id.eq(id))
        .first::<Subscription>(backend.connection())
        .map_err(|x| Error::Subscriptions(format!("{}", x)))?;

    let filters = validation::validate_filters(
        backend,
        &existing.entity(),
        &existing.claims_role,
        filters,
    )?;

    update(subscription::table.filter(subscription::id.eq(id)))
        .set(subscription::filters.eq(filters))
        .get_result::<Subscription>(backend.connection())
        .map_err(|x| Error::Subscriptions(format!("{}", x)))
}

/// Remove every row of a client subscription, returns the number deleted
pub fn delete_subscription(
    backend: &mut PgBackend,
    subscription_id: uuid::Uuid,
) -> Result<usize, Error> {
    let deleted = delete(
        subscription::table.filter(subscription::subscription_id.eq(subscription_id)),
    )
    .execute(backend.connection())
    .map_err(|x| Error::Subscriptions(format!("{}", x)))?;

    info!("Deleted subscription {} ({} rows)", subscription_id, deleted);
    Ok(deleted)
}
