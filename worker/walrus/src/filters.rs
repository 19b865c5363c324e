//! Per row visibility: user defined filters and row level security probes

pub mod row_level_security;
pub mod user_defined;
