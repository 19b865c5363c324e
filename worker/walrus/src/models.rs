pub mod realtime;
pub mod wal2json;
pub mod walrus;
