use clap::Parser;
use miette::{IntoDiagnostic, Result};
use orderflow::application::engine::DispatchEngine;
use orderflow::application::reporter::Reporter;
use orderflow::config::{EngineArgs, EngineConfig};
use orderflow::domain::ports::OrderStoreRef;
use orderflow::infrastructure::in_memory::InMemoryOrderStore;
#[cfg(feature = "storage-rocksdb")]
use orderflow::infrastructure::rocksdb::RocksDBStore;
use orderflow::interfaces::csv::order_reader::OrderReader;
use orderflow::interfaces::csv::order_writer::OrderWriter;
use orderflow::telemetry::{LogFormat, init_logging};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const SETTLE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input orders CSV file (order_id, priority, processing_time)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    db_path: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn open_store(db_path: Option<PathBuf>) -> Result<OrderStoreRef> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(path) = db_path {
        let store = RocksDBStore::open(&path).into_diagnostic()?;
        info!(path = %path.display(), "using RocksDB order store");
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    Ok(Arc::new(InMemoryOrderStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format).into_diagnostic()?;

    let config = EngineConfig::try_from(cli.engine).into_diagnostic()?;
    let store = open_store(cli.db_path)?;
    let engine = DispatchEngine::new(store.clone(), config);
    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping workers");
                cancel.cancel();
            }
        }
    });

    let reporter = Reporter::new(store.clone(), config.report_interval);
    let reporter_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { reporter.run(cancel).await }
    });
    let mut engine_task = tokio::spawn({
        let engine = engine.clone();
        let cancel = cancel.clone();
        async move { engine.run(cancel).await }
    });

    // Submit orders
    let file = File::open(&cli.input).into_diagnostic()?;
    for request in OrderReader::new(file).orders() {
        match request {
            Ok(request) => {
                let order_id = request.order_id.clone();
                if let Err(e) = engine
                    .create_order(request.order_id, request.priority, request.processing_time)
                    .await
                {
                    error!(%order_id, error = %e, "Error submitting order");
                }
            }
            Err(e) => error!(error = %e, "Error reading order"),
        }
    }

    // Wait for the backlog to drain, an interrupt, or the pool failing on startup
    let finished = tokio::select! {
        settled = engine.settled(SETTLE_POLL, &cancel) => {
            settled.into_diagnostic()?;
            None
        }
        finished = &mut engine_task => Some(finished),
    };
    cancel.cancel();
    let finished = match finished {
        Some(finished) => finished,
        None => engine_task.await,
    };
    finished.into_diagnostic()?.into_diagnostic()?;
    reporter_task.await.into_diagnostic()?;

    let report = engine.status_report().await.into_diagnostic()?;
    info!(%report, "final order status report");

    // Output final state
    let orders = store.all_orders().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_orders(orders).into_diagnostic()?;

    Ok(())
}
