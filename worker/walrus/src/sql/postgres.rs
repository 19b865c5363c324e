use crate::backend::{Catalog, ProbeExecutor, SubscriptionStore, WalSource};
use crate::broadcast::{BroadcastMessage, MessageSink};
use crate::errors::Error;
use crate::filters::row_level_security::{AuthContext, ProbeQuery};
use crate::models::realtime::{self, Entity, Subscription};
use crate::sql::{catalog, migrations};
use crate::sql::schema::realtime::{messages, subscription};
use diesel::pg::Pg;
use diesel::sql_types::*;
use diesel::*;
use log::info;

#[derive(QueryableByName)]
struct ProbeRow {
    #[diesel(sql_type = Bool)]
    visible: bool,
}

#[derive(QueryableByName)]
struct ChangeRow {
    #[diesel(sql_type = Text)]
    data: String,
}

/// Everything the worker needs from PostgreSQL over a single connection
pub struct PgBackend {
    conn: PgConnection,
}

impl PgBackend {
    pub fn establish(url: &str) -> Result<Self, Error> {
        let conn = PgConnection::establish(url)
            .map_err(|x| Error::PostgresConnectionError(format!("{}", x)))?;
        Ok(Self { conn })
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    pub fn run_migrations(&mut self) -> Result<(), Error> {
        migrations::run_migrations(&mut self.conn)
    }

    /// Create the wal2json logical replication slot unless it already exists
    pub fn ensure_slot(&mut self, slot: &str) -> Result<(), Error> {
        let created = sql_query(
            "select pg_create_logical_replication_slot($1, 'wal2json') \
             where not exists (select 1 from pg_replication_slots where slot_name = $1)",
        )
        .bind::<Text, _>(slot)
        .execute(&mut self.conn)
        .map_err(|x| Error::Walrus(format!("Failed to create slot {}: {}", slot, x)))?;

        if created > 0 {
            info!("Created replication slot {}", slot);
        }
        Ok(())
    }
}

impl Catalog for PgBackend {
    fn selectable_columns(
        &mut self,
        entity: &Entity,
        role: &str,
    ) -> Result<Vec<realtime::Column>, Error> {
        catalog::selectable_columns(entity, role, &mut self.conn)
    }

    fn is_rls_enabled(&mut self, entity: &Entity) -> Result<bool, Error> {
        catalog::is_rls_enabled(entity, &mut self.conn)
    }

    fn is_in_publication(&mut self, entity: &Entity, publication: &str) -> Result<bool, Error> {
        catalog::is_in_publication(entity, publication, &mut self.conn)
    }
}

impl ProbeExecutor for PgBackend {
    fn execute_probe(&mut self, query: &ProbeQuery, auth: &AuthContext) -> Result<bool, Error> {
        // set_config(.., true) is transaction local, a failed probe rolls
        // back the role and claims with it
        self.conn
            .transaction::<bool, diesel::result::Error, _>(|conn| {
                sql_query(
                    "select set_config('role', $1, true), \
                     set_config('request.jwt.claims', $2, true)",
                )
                .bind::<Text, _>(&auth.role)
                .bind::<Text, _>(auth.claims.to_string())
                .execute(conn)?;

                let mut probe = sql_query(query.sql.as_str()).into_boxed::<Pg>();
                for arg in &query.args {
                    probe = probe.bind::<Nullable<Text>, _>(arg.clone());
                }
                let row = probe.get_result::<ProbeRow>(conn)?;

                sql_query("reset role").execute(conn)?;
                sql_query("select set_config('request.jwt.claims', null, true)").execute(conn)?;
                Ok(row.visible)
            })
            .map_err(|x| Error::SQLFunction(format!("RLS probe failed: {}", x)))
    }
}

impl SubscriptionStore for PgBackend {
    fn load_subscriptions(&mut self) -> Result<Vec<Subscription>, Error> {
        subscription::table
            .load::<Subscription>(&mut self.conn)
            .map_err(|x| Error::Subscriptions(format!("{}", x)))
    }

    fn load_subscription(&mut self, id: i64) -> Result<Subscription, Error> {
        subscription::table
            .filter(subscription::id.eq(id))
            .first::<Subscription>(&mut self.conn)
            .map_err(|x| Error::Subscriptions(format!("{}", x)))
    }
}

impl WalSource for PgBackend {
    fn get_changes(
        &mut self,
        slot: &str,
        publication: &str,
        max_changes: i32,
    ) -> Result<Vec<String>, Error> {
        let actions = catalog::publication_actions(publication, &mut self.conn)?;

        let rows = sql_query(
            "select data from pg_logical_slot_get_changes(\
             $1, null, $2, \
             'include-pk', 'true', \
             'include-transaction', 'false', \
             'include-timestamp', 'true', \
             'include-type-oids', 'true', \
             'format-version', '2', \
             'actions', $3)",
        )
        .bind::<Text, _>(slot)
        .bind::<Integer, _>(max_changes)
        .bind::<Text, _>(actions)
        .load::<ChangeRow>(&mut self.conn)
        .map_err(|x| Error::Walrus(format!("Failed to read slot {}: {}", slot, x)))?;

        Ok(rows.into_iter().map(|x| x.data).collect())
    }
}

impl MessageSink for PgBackend {
    fn send(&mut self, message: &BroadcastMessage) -> Result<(), Error> {
        insert_into(messages::table)
            .values((
                messages::topic.eq(&message.topic),
                messages::extension.eq("broadcast"),
                messages::event.eq(&message.event),
                messages::payload.eq(&message.payload),
                messages::private.eq(message.private),
            ))
            .execute(&mut self.conn)
            .map(|_| ())
            .map_err(|x| Error::Broadcast(format!("{}", x)))
    }
}
