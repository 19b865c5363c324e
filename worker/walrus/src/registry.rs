use crate::backend::SubscriptionStore;
use crate::errors::Error;
use crate::models::realtime::{Entity, Subscription};
use crate::models::wal2json;
use log::{debug, error, info};

/// In-memory copy of `realtime.subscription`
#[derive(Debug, Default, Clone)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self { subscriptions }
    }

    pub fn load<S: SubscriptionStore>(store: &mut S) -> Result<Self, Error> {
        let subscriptions = store.load_subscriptions()?;
        info!("Loaded {} subscriptions", subscriptions.len());
        Ok(Self::new(subscriptions))
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn list_by_entity(&self, entity: &Entity) -> Vec<&Subscription> {
        self.subscriptions
            .iter()
            .filter(|x| x.watches(entity))
            .collect()
    }

    /// Replaces any subscription with the same row id
    pub fn insert(&mut self, sub: Subscription) {
        self.remove(sub.id);
        self.subscriptions.push(sub);
    }

    pub fn remove(&mut self, id: i64) {
        self.subscriptions.retain(|x| x.id != id);
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    /// Keeps the registry in sync with changes to `realtime.subscription`
    /// seen in the WAL. Returns false for records on any other table.
    pub fn apply_wal<S: SubscriptionStore>(
        &mut self,
        rec: &wal2json::Record,
        store: &mut S,
    ) -> bool {
        if rec.schema != "realtime" || rec.table != "subscription" {
            return false;
        }

        debug!("Subscription record detected");

        if rec.action == wal2json::Action::T {
            self.clear();
            debug!("Subscription truncate. Total {}", self.len());
            return true;
        }

        let id = match subscription_row_id(rec) {
            Some(id) => id,
            None => {
                error!("No valid id column found on realtime.subscription");
                return true;
            }
        };

        match rec.action {
            wal2json::Action::I | wal2json::Action::U => match store.load_subscription(id) {
                Ok(sub) => {
                    self.insert(sub);
                    debug!("Subscription {} upserted. Total {}", id, self.len());
                }
                Err(err) => {
                    // a later delete in the same batch can race the lookup
                    self.remove(id);
                    error!("No subscription found: id={}, Error: {}", id, err);
                }
            },
            wal2json::Action::D => {
                self.remove(id);
                debug!("Subscription {} deleted. Total {}", id, self.len());
            }
            _ => (),
        }
        true
    }
}

/// Distinct `claims_role` values in first-seen order
pub fn distinct_roles<'a>(subscriptions: &[&'a Subscription]) -> Vec<&'a str> {
    let mut roles: Vec<&str> = vec![];
    for sub in subscriptions {
        if !roles.contains(&sub.claims_role.as_str()) {
            roles.push(&sub.claims_role);
        }
    }
    roles
}

fn subscription_row_id(rec: &wal2json::Record) -> Option<i64> {
    // deletes carry the id in the identity
    let columns = rec.columns.as_ref().or(rec.identity.as_ref())?;
    let value = &columns.iter().find(|x| x.name == "id")?.value;

    match value {
        serde_json::Value::Number(x) => x.as_i64(),
        serde_json::Value::String(x) => x.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{subscription, FakeBackend};

    fn record(line: &str) -> wal2json::Record {
        crate::decoder::parse_line(line).unwrap()
    }

    #[test]
    fn test_list_by_entity_and_roles() {
        let registry = SubscriptionRegistry::new(vec![
            subscription(1, "authenticated", "public", "orders", vec![]),
            subscription(2, "anon", "public", "orders", vec![]),
            subscription(3, "authenticated", "public", "orders", vec![]),
            subscription(4, "authenticated", "public", "users", vec![]),
        ]);

        let subs = registry.list_by_entity(&Entity::new("public", "orders"));
        assert_eq!(subs.iter().map(|x| x.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(distinct_roles(&subs), vec!["authenticated", "anon"]);

        assert!(registry
            .list_by_entity(&Entity::new("public", "missing"))
            .is_empty());
    }

    #[test]
    fn test_apply_wal_insert_update_delete() {
        let mut store = FakeBackend::default();
        store
            .subscriptions
            .push(subscription(7, "authenticated", "public", "orders", vec![]));
        let mut registry = SubscriptionRegistry::default();

        let insert = record(
            r#"{"action":"I","timestamp":"2022-06-22 15:38:19+00","schema":"realtime","table":"subscription","columns":[{"name":"id","type":"bigint","typeoid":20,"value":7}]}"#,
        );
        assert!(registry.apply_wal(&insert, &mut store));
        assert_eq!(registry.len(), 1);

        // updates replace rather than duplicate
        let update = record(
            r#"{"action":"U","timestamp":"2022-06-22 15:38:19+00","schema":"realtime","table":"subscription","columns":[{"name":"id","type":"bigint","typeoid":20,"value":7}]}"#,
        );
        assert!(registry.apply_wal(&update, &mut store));
        assert_eq!(registry.len(), 1);

        let delete = record(
            r#"{"action":"D","timestamp":"2022-06-22 15:38:19+00","schema":"realtime","table":"subscription","identity":[{"name":"id","type":"bigint","typeoid":20,"value":7}]}"#,
        );
        assert!(registry.apply_wal(&delete, &mut store));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_wal_truncate_and_other_tables() {
        let mut store = FakeBackend::default();
        let mut registry = SubscriptionRegistry::new(vec![subscription(
            1,
            "authenticated",
            "public",
            "orders",
            vec![],
        )]);

        let other = record(
            r#"{"action":"I","timestamp":"2022-06-22 15:38:19+00","schema":"public","table":"orders","columns":[{"name":"id","type":"bigint","typeoid":20,"value":1}]}"#,
        );
        assert!(!registry.apply_wal(&other, &mut store));
        assert_eq!(registry.len(), 1);

        let truncate = record(
            r#"{"action":"T","timestamp":"2022-06-22 15:38:19+00","schema":"realtime","table":"subscription"}"#,
        );
        assert!(registry.apply_wal(&truncate, &mut store));
        assert!(registry.is_empty());
    }
}
