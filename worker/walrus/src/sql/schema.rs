pub mod realtime {
    diesel::table! {
        use diesel::sql_types::*;
        use crate::models::realtime::UserDefinedFilterType;

        realtime.subscription (id) {
            id -> Int8,
            subscription_id -> Uuid,
            entity -> Oid,
            filters -> Array<UserDefinedFilterType>,
            claims -> Jsonb,
            claims_role -> Text,
            created_at -> Timestamp,
            schema_name -> Text,
            table_name -> Text,
        }
    }

    diesel::table! {
        realtime.messages (id) {
            id -> Int8,
            topic -> Text,
            extension -> Text,
            event -> Nullable<Text>,
            payload -> Nullable<Jsonb>,
            private -> Bool,
            inserted_at -> Timestamp,
        }
    }
}
