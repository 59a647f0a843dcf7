use clap::{Parser, ValueEnum};
use hostq_application::{Extras, ResolverPool};
use hostq_domain::{CliOverrides, Config, LookupAnswer};
use hostq_infrastructure::SystemResolver;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

mod bootstrap;

#[derive(Parser)]
#[command(name = "hostq")]
#[command(version)]
#[command(about = "Queued host lookups over a worker pool with a TTL cache")]
struct Cli {
    /// Names or addresses to look up
    #[arg(required = true, value_name = "QUERY")]
    queries: Vec<String>,

    /// Lookup mode applied to every query
    #[arg(short, long, value_enum, default_value = "forward")]
    mode: Mode,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Worker thread count
    #[arg(short, long)]
    workers: Option<usize>,

    /// Cache TTL in seconds
    #[arg(short, long)]
    ttl: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Name to a single address
    Forward,
    /// Name to canonical name, aliases and all addresses
    Extended,
    /// Address to hostname
    Reverse,
    /// Name to socket-address records
    Addrinfo,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        workers: cli.workers,
        cache_ttl_secs: cli.ttl,
        log_level: cli.log_level.clone(),
    };
    let config = Config::load(cli.config.as_deref(), overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting hostq v{}", env!("CARGO_PKG_VERSION"));

    let pool = ResolverPool::new(Arc::new(SystemResolver::new()), &config.pool);
    pool.configure(None, None)?;

    let expected = cli.queries.len();
    let completed = Arc::new(AtomicUsize::new(0));

    for query in &cli.queries {
        let mut extras = Extras::new();
        extras.insert(
            "argument".to_string(),
            serde_json::Value::String(query.clone()),
        );

        let done = Arc::clone(&completed);
        let callback = move |answer: Option<LookupAnswer>, extras: Extras| {
            let argument = extras
                .get("argument")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            match answer {
                Some(answer) => println!("{argument}: {answer}"),
                None => println!("{argument}: no result"),
            }
            done.fetch_add(1, Ordering::SeqCst);
        };

        match cli.mode {
            Mode::Forward => pool.lookup_host(query.clone(), extras, callback),
            Mode::Extended => pool.lookup_host_extended(query.clone(), extras, callback),
            Mode::Reverse => pool.lookup_addr(query.clone(), extras, callback),
            Mode::Addrinfo => pool.lookup_addr_info(query.clone(), extras, callback),
        }
    }

    // Callbacks only ever run here, on the main thread.
    while completed.load(Ordering::SeqCst) < expected {
        pool.run(false)?;
        thread::sleep(Duration::from_millis(25));
    }

    if let Some(stats) = pool.cache_stats() {
        debug!(
            entries = stats.entries,
            hits = stats.hits,
            misses = stats.misses,
            "Cache statistics at shutdown"
        );
    }

    pool.stop(false);
    info!("Shutdown complete");
    Ok(())
}
