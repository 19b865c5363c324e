//! Seams between the dispatch pipeline and the database.
//!
//! `sql::postgres::PgBackend` implements all of them over a diesel connection.

use crate::errors::Error;
use crate::filters::row_level_security::{AuthContext, ProbeQuery};
use crate::models::realtime::{Entity, Subscription};

/// Read-only view of the relational catalog
pub trait Catalog {
    /// Columns `role` may SELECT on `entity`, in column position order
    fn selectable_columns(
        &mut self,
        entity: &Entity,
        role: &str,
    ) -> Result<Vec<crate::models::realtime::Column>, Error>;

    fn is_rls_enabled(&mut self, entity: &Entity) -> Result<bool, Error>;

    fn is_in_publication(&mut self, entity: &Entity, publication: &str) -> Result<bool, Error>;
}

/// Runs row level security existence probes
pub trait ProbeExecutor {
    /// Execute `query` as `auth.role` with `auth.claims` as the request
    /// claims. Implementations must restore the previous role and claims on
    /// every exit path.
    fn execute_probe(&mut self, query: &ProbeQuery, auth: &AuthContext) -> Result<bool, Error>;
}

pub trait SubscriptionStore {
    fn load_subscriptions(&mut self) -> Result<Vec<Subscription>, Error>;

    fn load_subscription(&mut self, id: i64) -> Result<Subscription, Error>;
}

/// Raw wal2json lines from a logical replication slot
pub trait WalSource {
    fn get_changes(
        &mut self,
        slot: &str,
        publication: &str,
        max_changes: i32,
    ) -> Result<Vec<String>, Error>;
}
