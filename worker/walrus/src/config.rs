use std::time::Duration;

pub const DEFAULT_MAX_RECORD_BYTES: usize = 1024 * 1024;

/// Worker settings, built by the binary from its command line
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub slot: String,
    pub publication: String,
    /// Upper bound on WAL records pulled per batch
    pub max_changes: i32,
    pub max_record_bytes: usize,
    /// Sleep between polls that returned nothing
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slot: "realtime".to_string(),
            publication: "supabase_realtime".to_string(),
            max_changes: 1000,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            poll_interval: Duration::from_millis(100),
        }
    }
}
