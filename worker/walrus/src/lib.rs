//! Write-Ahead-Log Realtime Unified Security (WALRUS).
//!
//! Decodes wal2json change records, decides which realtime subscriptions may
//! see each row (column privileges, user defined filters, row level
//! security) and assembles the change event delivered to them.

pub mod assembler;
pub mod backend;
pub mod broadcast;
pub mod cast;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod errors;
pub mod filters;
pub mod models;
pub mod registry;
pub mod sql;
pub mod timestamp_fmt;
pub mod validation;
pub mod worker;

#[cfg(test)]
mod testing;
