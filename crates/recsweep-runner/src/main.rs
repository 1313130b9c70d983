#![doc = include_str!("../README.md")]

mod runner;

use clap::Parser;
use recsweep::{
    BatchStats, CancellationToken, Error, PoolConfig, PoolReport, SharedRunningStats,
    StatsTracked, Task, WorkerPool,
};
use runner::computation::SyntheticRecommender;
use runner::config::{CliArgs, RunConfig};
use runner::sink::JsonLinesSink;
use runner::source::build_source;
#[cfg(feature = "tracing")]
use runner::source::planned_len;
use runner::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let source = build_source(&config)?;
    let sink = Arc::new(JsonLinesSink::open(&config.output)?);
    let shutdown = CancellationToken::new();
    let recommender = SyntheticRecommender::new(
        config.catalog_size,
        config.latency,
        config.failure_rate,
        config.seed,
        shutdown.child_token(),
    );

    let stats = BatchStats::new();
    let pool = WorkerPool::new(
        PoolConfig::new(config.num_workers, config.result_size),
        source,
        recommender,
        Arc::clone(&sink),
        stats.clone(),
    )?;
    let pool_token = pool.shutdown_token();

    // Times the whole sweep; per-item timing lives in `stats`.
    let run_timing = SharedRunningStats::new();
    let mut pool = Some(pool);
    let mut sweep = StatsTracked::new(
        move || pool.take().ok_or(Error::AlreadyStarted)?.run(),
        false,
        run_timing.clone(),
        stats.failures().clone(),
    );
    let mut sweep = tokio::task::spawn_blocking(move || sweep.call());

    let outcome = tokio::select! {
        joined = &mut sweep => joined?,
        () = shutdown_signal() => {
            #[cfg(feature = "tracing")]
            tracing::info!("Stopping workers; in-flight users will finish");
            shutdown.cancel();
            pool_token.cancel();
            sweep.await?
        }
    };

    sink.flush()?;

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            if let Error::WorkerPanicked { partial, .. } = &e {
                log_report(partial, &stats, run_timing.average());
            }
            return Err(e.into());
        }
    };

    log_report(&report, &stats, run_timing.average());
    if config.log_stats {
        stats.log_summary();
    }

    Ok(())
}

fn log_startup_info(_config: &RunConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!("Starting sweep with full config: {:#?}", _config);
    } else {
        #[cfg(feature = "tracing")]
        match planned_len(_config) {
            Some(users) => tracing::info!(
                "Starting sweep of {} users with {} workers",
                users,
                _config.num_workers
            ),
            None => tracing::info!("Starting sweep with {} workers", _config.num_workers),
        }
    }
}

fn log_report(_report: &PoolReport, _stats: &BatchStats, _elapsed_ms: f64) {
    #[cfg(feature = "tracing")]
    {
        tracing::info!(
            "Sweep {} after {:.0} ms: {} users processed, {} failed",
            if _report.stopped() { "stopped" } else { "finished" },
            _elapsed_ms,
            _report.processed(),
            _report.failed()
        );
        tracing::info!(
            "Time per user: {:.2} ms average, {:.2} ms standard deviation over {} samples",
            _stats.timing().average(),
            _stats.timing().standard_deviation(),
            _stats.timing().count()
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }
}
