use crate::backend::{Catalog, ProbeExecutor, SubscriptionStore, WalSource};
use crate::config::Config;
use crate::decoder;
use crate::dispatcher::Dispatcher;
use crate::errors::Error;
use crate::models::realtime::DispatchResult;
use crate::registry::SubscriptionRegistry;
use log::{debug, error};

/// Pulls batches from the replication slot and dispatches them
pub struct Worker<B> {
    backend: B,
    registry: SubscriptionRegistry,
    dispatcher: Dispatcher,
    config: Config,
}

impl<B> Worker<B>
where
    B: Catalog + ProbeExecutor + SubscriptionStore + WalSource,
{
    pub fn new(mut backend: B, config: Config) -> Result<Self, Error> {
        let registry = SubscriptionRegistry::load(&mut backend)?;
        Ok(Self {
            backend,
            registry,
            dispatcher: Dispatcher::new(config.max_record_bytes),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// One batch with the configured slot, publication and limits
    pub fn poll(&mut self) -> Result<Vec<DispatchResult>, Error> {
        let Config {
            slot,
            publication,
            max_changes,
            max_record_bytes,
            ..
        } = self.config.clone();
        self.list_changes(&publication, &slot, max_changes, max_record_bytes)
    }

    /// Consume up to `max_changes` records from `slot` and return the results
    /// that reach at least one subscription, in WAL order
    pub fn list_changes(
        &mut self,
        publication: &str,
        slot: &str,
        max_changes: i32,
        max_record_bytes: usize,
    ) -> Result<Vec<DispatchResult>, Error> {
        let lines = self.backend.get_changes(slot, publication, max_changes)?;
        self.dispatcher.set_max_record_bytes(max_record_bytes);

        let mut out = vec![];
        for line in lines {
            let rec = match decoder::parse_line(&line) {
                Ok(rec) => rec,
                Err(err) => {
                    error!("{}", err);
                    continue;
                }
            };

            self.registry.apply_wal(&rec, &mut self.backend);

            let change = decoder::decode(&rec, line.len());
            if !change.action.is_row_change() {
                continue;
            }

            match self.backend.is_in_publication(&change.entity, publication) {
                Ok(true) => (),
                Ok(false) => {
                    debug!("{} is not in publication {}", change.entity, publication);
                    continue;
                }
                Err(err) => {
                    error!("Failed to check publication for {}: {}", change.entity, err);
                    continue;
                }
            }

            let dispatch = self
                .dispatcher
                .dispatch(&change, &self.registry, &mut self.backend);
            out.extend(
                dispatch
                    .results
                    .into_iter()
                    .filter(DispatchResult::is_deliverable),
            );
        }

        self.dispatcher.end_batch();
        Ok(out)
    }
}
