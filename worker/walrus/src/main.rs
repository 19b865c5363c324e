use clap::Parser;
use log::{error, info};
use std::process;
use std::thread;
use std::time::Duration;
use walrus::config::Config;
use walrus::errors::Error;
use walrus::sql::postgres::PgBackend;
use walrus::worker::Worker;

/// Write-Ahead-Log Realtime Unified Security (WALRUS) background worker
/// runs next to a PostgreSQL instance and forwards its Write-Ahead-Log
/// to external services
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(
        long,
        env = "DATABASE_URL",
        default_value = "postgresql://postgres@localhost:5432/postgres"
    )]
    connection: String,

    #[clap(long, env = "WALRUS_SLOT", default_value = "realtime")]
    slot: String,

    #[clap(long, env = "WALRUS_PUBLICATION", default_value = "supabase_realtime")]
    publication: String,

    /// Maximum WAL records consumed per batch
    #[clap(long, env = "WALRUS_MAX_CHANGES", default_value_t = 1000)]
    max_changes: i32,

    /// Records larger than this have their large fields dropped
    #[clap(long, env = "WALRUS_MAX_RECORD_BYTES", default_value_t = 1048576)]
    max_record_bytes: usize,

    #[clap(long, env = "WALRUS_POLL_INTERVAL_MS", default_value_t = 100)]
    poll_interval_ms: u64,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            slot: args.slot,
            publication: args.publication,
            max_changes: args.max_changes,
            max_record_bytes: args.max_record_bytes,
            poll_interval: Duration::from_millis(args.poll_interval_ms),
        }
    }
}

fn start(connection: &str, config: Config) -> Result<Worker<PgBackend>, Error> {
    let mut backend = PgBackend::establish(connection)?;
    backend.run_migrations()?;
    backend.ensure_slot(&config.slot)?;
    Worker::new(backend, config)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let connection = args.connection.clone();
    let config = Config::from(args);

    let mut worker = match start(&connection, config) {
        Ok(worker) => worker,
        Err(err) => {
            error!("Failed to start: {}", err);
            process::exit(1);
        }
    };
    info!(
        "Streaming slot {} for publication {}",
        worker.config().slot,
        worker.config().publication
    );

    loop {
        let results = match worker.poll() {
            Ok(results) => results,
            Err(err) => {
                error!("WALRUS Error: {}", err);
                vec![]
            }
        };

        if results.is_empty() {
            thread::sleep(worker.config().poll_interval);
            continue;
        }

        for result in results {
            match serde_json::to_string(&result) {
                Ok(line) => println!("{}", line),
                Err(err) => error!("Failed to serialize walrus result: {}", err),
            }
        }
    }
}
