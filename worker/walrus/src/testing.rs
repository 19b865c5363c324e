//! In-memory backend for pipeline tests

use crate::backend::{Catalog, ProbeExecutor, SubscriptionStore, WalSource};
use crate::broadcast::{BroadcastMessage, MessageSink};
use crate::errors::Error;
use crate::filters::row_level_security::{AuthContext, ProbeQuery};
use crate::models::realtime::{self, Entity, Subscription, UserDefinedFilter};
use std::collections::{HashMap, HashSet};

type Policy = Box<dyn Fn(&ProbeQuery, &AuthContext) -> Result<bool, Error>>;

#[derive(Default)]
pub struct FakeBackend {
    pub grants: HashMap<(Entity, String), Vec<realtime::Column>>,
    pub rls_enabled: HashSet<Entity>,
    pub published: HashSet<Entity>,
    pub subscriptions: Vec<Subscription>,
    pub lines: Vec<String>,
    /// Row visibility under RLS, everything is visible when unset
    pub policy: Option<Policy>,
    /// Every probe executed, in order
    pub probes: Vec<(ProbeQuery, AuthContext)>,
    /// Role in effect, only set while a probe runs
    pub active_role: Option<String>,
    pub messages: Vec<BroadcastMessage>,
    pub fail_sends: bool,
}

impl FakeBackend {
    pub fn grant(mut self, entity: &Entity, role: &str, columns: &[(&str, &str)]) -> Self {
        let columns = columns
            .iter()
            .map(|(name, type_)| realtime::Column {
                name: name.to_string(),
                type_: type_.to_string(),
            })
            .collect();
        self.grants.insert((entity.clone(), role.to_string()), columns);
        self
    }

    pub fn enable_rls(mut self, entity: &Entity) -> Self {
        self.rls_enabled.insert(entity.clone());
        self
    }

    pub fn publish(mut self, entity: &Entity) -> Self {
        self.published.insert(entity.clone());
        self
    }

    pub fn with_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&ProbeQuery, &AuthContext) -> Result<bool, Error> + 'static,
    {
        self.policy = Some(Box::new(policy));
        self
    }
}

impl Catalog for FakeBackend {
    fn selectable_columns(
        &mut self,
        entity: &Entity,
        role: &str,
    ) -> Result<Vec<realtime::Column>, Error> {
        Ok(self
            .grants
            .get(&(entity.clone(), role.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn is_rls_enabled(&mut self, entity: &Entity) -> Result<bool, Error> {
        Ok(self.rls_enabled.contains(entity))
    }

    fn is_in_publication(&mut self, entity: &Entity, _publication: &str) -> Result<bool, Error> {
        Ok(self.published.contains(entity))
    }
}

impl ProbeExecutor for FakeBackend {
    fn execute_probe(&mut self, query: &ProbeQuery, auth: &AuthContext) -> Result<bool, Error> {
        self.active_role = Some(auth.role.clone());
        let visible = match &self.policy {
            Some(policy) => policy(query, auth),
            None => Ok(true),
        };
        self.active_role = None;
        self.probes.push((query.clone(), auth.clone()));
        visible
    }
}

impl SubscriptionStore for FakeBackend {
    fn load_subscriptions(&mut self) -> Result<Vec<Subscription>, Error> {
        Ok(self.subscriptions.clone())
    }

    fn load_subscription(&mut self, id: i64) -> Result<Subscription, Error> {
        self.subscriptions
            .iter()
            .find(|x| x.id == id)
            .cloned()
            .ok_or_else(|| Error::Subscriptions(format!("subscription {} not found", id)))
    }
}

impl WalSource for FakeBackend {
    fn get_changes(
        &mut self,
        _slot: &str,
        _publication: &str,
        max_changes: i32,
    ) -> Result<Vec<String>, Error> {
        let n = (max_changes.max(0) as usize).min(self.lines.len());
        Ok(self.lines.drain(..n).collect())
    }
}

impl MessageSink for FakeBackend {
    fn send(&mut self, message: &BroadcastMessage) -> Result<(), Error> {
        if self.fail_sends {
            return Err(Error::Walrus("sink unavailable".to_string()));
        }
        self.messages.push(message.clone());
        Ok(())
    }
}

/// A subscription whose uuid is derived from `id`
pub fn subscription(
    id: i64,
    role: &str,
    schema: &str,
    table: &str,
    filters: Vec<UserDefinedFilter>,
) -> Subscription {
    Subscription {
        id,
        subscription_id: uuid::Uuid::from_u128(id as u128),
        entity: 0,
        filters,
        claims: serde_json::json!({ "role": role, "sub": format!("user-{}", id) }),
        claims_role: role.to_string(),
        created_at: chrono::NaiveDate::from_ymd_opt(2022, 6, 22)
            .and_then(|x| x.and_hms_opt(15, 38, 19))
            .unwrap(),
        schema_name: schema.to_string(),
        table_name: table.to_string(),
    }
}
