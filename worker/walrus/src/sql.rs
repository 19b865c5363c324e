pub mod catalog;
pub mod migrations;
pub mod postgres;
pub mod schema;
pub mod subscriptions;
