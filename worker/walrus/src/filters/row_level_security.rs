use crate::backend::ProbeExecutor;
use crate::cast::PgType;
use crate::errors::{Error, RowError};
use crate::models::realtime::{Action, Entity, Subscription};
use crate::models::walrus;
use log::debug;
use std::collections::HashMap;

/// `select exists(...)` over the primary key of a row, with its values as
/// positional arguments. Identifiers come from the WAL record's primary key
/// columns, which the acting role has been checked to SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeQuery {
    pub sql: String,
    pub args: Vec<Option<String>>,
}

/// The role and claims a probe runs under
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub role: String,
    pub claims: serde_json::Value,
}

impl AuthContext {
    pub fn for_subscription(sub: &Subscription) -> Self {
        Self {
            role: sub.claims_role.clone(),
            claims: sub.claims.clone(),
        }
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Primary key gates applied before a non-DELETE record is dispatched to a role.
/// Deletes can't be checked against RLS after the fact and skip them.
pub fn check_primary_key(
    action: Action,
    has_primary_key: bool,
    columns: &[walrus::Column],
) -> Result<(), RowError> {
    if action == Action::DELETE {
        return Ok(());
    }
    if !has_primary_key {
        return Err(RowError::BadRequest);
    }

    let mut pkeys = columns.iter().filter(|x| x.is_pkey).peekable();
    if pkeys.peek().is_none() || pkeys.any(|x| !x.is_selectable) {
        return Err(RowError::Unauthorized);
    }
    Ok(())
}

pub fn build_probe(entity: &Entity, columns: &[walrus::Column]) -> Result<ProbeQuery, RowError> {
    let pkeys: Vec<&walrus::Column> = columns.iter().filter(|x| x.is_pkey).collect();

    if pkeys.is_empty() || pkeys.iter().any(|x| !x.is_selectable) {
        return Err(RowError::Unauthorized);
    }

    let conditions: Vec<String> = pkeys
        .iter()
        .enumerate()
        .map(|(ix, col)| match PgType::resolve(col.type_oid, &col.type_name) {
            Some(type_) => format!("{} = ${}::{}", quote_ident(&col.name), ix + 1, type_),
            None => format!("{}::text = ${}", quote_ident(&col.name), ix + 1),
        })
        .collect();

    Ok(ProbeQuery {
        sql: format!(
            "select exists(select 1 from {}.{} where {}) as visible",
            quote_ident(&entity.schema),
            quote_ident(&entity.table),
            conditions.join(" and ")
        ),
        args: pkeys.iter().map(|x| x.value_text()).collect(),
    })
}

/// The current probe of each working role. A probe binds one row's primary
/// key values, so the dispatcher builds a new one for every row and it
/// replaces the role's previous entry. Nothing is reused across rows, the
/// map only bounds what is held to one query per role. Cleared between
/// batches.
#[derive(Debug, Default)]
pub struct ProbeCache {
    plans: HashMap<String, ProbeQuery>,
}

impl ProbeCache {
    /// Install the probe for `role`, dropping the one built for the previous row
    pub fn prepare(&mut self, role: &str, query: ProbeQuery) {
        if self.plans.remove(role).is_some() {
            debug!("Replaced RLS probe for role {}", role);
        }
        self.plans.insert(role.to_string(), query);
    }

    pub fn get(&self, role: &str) -> Option<&ProbeQuery> {
        self.plans.get(role)
    }

    pub fn execute<E: ProbeExecutor>(
        &self,
        role: &str,
        auth: &AuthContext,
        executor: &mut E,
    ) -> Result<bool, Error> {
        let query = self
            .plans
            .get(role)
            .ok_or_else(|| Error::Walrus(format!("No RLS probe prepared for role {}", role)))?;
        executor.execute_probe(query, auth)
    }

    pub fn clear(&mut self) {
        self.plans.clear();
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Whether the subscription's role and claims may see the probed row
pub fn is_visible_through_rls<E: ProbeExecutor>(
    probes: &ProbeCache,
    subscription: &Subscription,
    executor: &mut E,
) -> Result<bool, Error> {
    let auth = AuthContext::for_subscription(subscription);
    probes.execute(&auth.role, &auth, executor)
}
