//! Per role fan-out of a decoded WAL record to its subscriptions

use crate::assembler;
use crate::backend::{Catalog, ProbeExecutor};
use crate::config::DEFAULT_MAX_RECORD_BYTES;
use crate::decoder::Change;
use crate::errors::{Error, RowError};
use crate::filters::row_level_security::{
    build_probe, check_primary_key, is_visible_through_rls, ProbeCache,
};
use crate::filters::user_defined::is_visible;
use crate::models::realtime::{Action, DispatchResult, Subscription};
use crate::models::walrus;
use crate::registry::{distinct_roles, SubscriptionRegistry};
use log::{debug, warn};

/// Every role's result for one WAL record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDispatch {
    pub results: Vec<DispatchResult>,
}

impl RecordDispatch {
    /// Visible subscription ids across all roles
    pub fn visible_subscription_ids(&self) -> Vec<uuid::Uuid> {
        self.results
            .iter()
            .flat_map(|x| x.visible_subscription_ids.iter().copied())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .flat_map(|x| x.errors.iter().cloned())
            .collect()
    }
}

pub struct Dispatcher {
    probes: ProbeCache,
    max_record_bytes: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORD_BYTES)
    }
}

impl Dispatcher {
    pub fn new(max_record_bytes: usize) -> Self {
        Self {
            probes: ProbeCache::default(),
            max_record_bytes,
        }
    }

    pub fn set_max_record_bytes(&mut self, max_record_bytes: usize) {
        self.max_record_bytes = max_record_bytes;
    }

    /// Drop the RLS probes prepared during a batch
    pub fn end_batch(&mut self) {
        self.probes.clear();
    }

    pub fn dispatch<B: Catalog + ProbeExecutor>(
        &mut self,
        change: &Change,
        registry: &SubscriptionRegistry,
        backend: &mut B,
    ) -> RecordDispatch {
        if !change.action.is_row_change() {
            debug!("Skipping {:?} on {}", change.action, change.entity);
            return RecordDispatch::default();
        }

        let subscriptions = registry.list_by_entity(&change.entity);
        if subscriptions.is_empty() {
            return RecordDispatch::default();
        }

        let is_rls_enabled = backend.is_rls_enabled(&change.entity);

        let results = distinct_roles(&subscriptions)
            .into_iter()
            .map(|role| {
                let role_subscriptions: Vec<&Subscription> = subscriptions
                    .iter()
                    .filter(|x| x.claims_role == role)
                    .copied()
                    .collect();

                let dispatched =
                    self.dispatch_role(change, role, &role_subscriptions, &is_rls_enabled, backend);
                dispatched.unwrap_or_else(|err| {
                    warn!("Failed to dispatch {} for role {}: {}", change.entity, role, err);
                    DispatchResult {
                        event: assembler::skeleton(change),
                        is_rls_enabled: is_rls_enabled.as_ref().map_or(true, |x| *x),
                        visible_subscription_ids: vec![],
                        errors: vec![err.to_string()],
                        rejected_subscription_ids: vec![],
                    }
                })
            })
            .collect();

        RecordDispatch { results }
    }

    fn dispatch_role<B: Catalog + ProbeExecutor>(
        &mut self,
        change: &Change,
        role: &str,
        subscriptions: &[&Subscription],
        is_rls_enabled: &Result<bool, Error>,
        backend: &mut B,
    ) -> Result<DispatchResult, Error> {
        let is_rls_enabled = is_rls_enabled.clone()?;
        let selectable = backend.selectable_columns(&change.entity, role)?;

        let columns = with_privileges(&change.columns, &selectable);
        let old_columns = with_privileges(&change.old_columns, &selectable);

        let rejected = |err: RowError| DispatchResult {
            event: assembler::skeleton(change),
            is_rls_enabled,
            visible_subscription_ids: vec![],
            errors: vec![err.to_string()],
            rejected_subscription_ids: subscriptions.iter().map(|x| x.subscription_id).collect(),
        };

        if let Err(err) = check_primary_key(change.action, change.has_primary_key, &columns) {
            debug!("Rejected {} for role {}: {}", change.entity, role, err);
            return Ok(rejected(err));
        }

        // deletes can't be probed, the row is gone
        let needs_probe = is_rls_enabled && change.action != Action::DELETE;
        if needs_probe {
            match build_probe(&change.entity, &columns) {
                Ok(probe) => self.probes.prepare(role, probe),
                Err(err) => return Ok(rejected(err)),
            }
        }

        let (event, size_error) = assembler::assemble(
            change,
            &columns,
            &old_columns,
            &selectable,
            is_rls_enabled,
            self.max_record_bytes,
        );
        let mut errors: Vec<String> = size_error.iter().map(ToString::to_string).collect();

        let mut visible_subscription_ids = vec![];
        for sub in subscriptions {
            let matched = is_visible(&columns, &sub.filters)
                || (change.action == Action::DELETE && is_visible(&old_columns, &sub.filters));
            if !matched {
                continue;
            }

            if !needs_probe {
                visible_subscription_ids.push(sub.subscription_id);
                continue;
            }

            match is_visible_through_rls(&self.probes, sub, backend) {
                Ok(true) => visible_subscription_ids.push(sub.subscription_id),
                Ok(false) => (),
                Err(err) => {
                    warn!(
                        "RLS probe failed for subscription {}: {}",
                        sub.subscription_id, err
                    );
                    errors.push(err.to_string());
                }
            }
        }

        Ok(DispatchResult {
            event,
            is_rls_enabled,
            visible_subscription_ids,
            errors,
            rejected_subscription_ids: vec![],
        })
    }
}

fn with_privileges(
    columns: &[walrus::Column],
    selectable: &[crate::models::realtime::Column],
) -> Vec<walrus::Column> {
    columns
        .iter()
        .map(|col| walrus::Column {
            is_selectable: selectable.iter().any(|x| x.name == col.name),
            ..col.clone()
        })
        .collect()
}
