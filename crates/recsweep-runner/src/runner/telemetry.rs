//! Console logging for the runner.
//!
//! Events from the `recsweep` library and this binary are printed through a
//! pretty `fmt` layer. Verbosity follows `RUST_LOG` and defaults to `info`;
//! `RUST_LOG=debug` additionally prints every result and snapshots memory
//! more often.
//!
//! ```bash
//! RUST_LOG=recsweep=debug cargo run -p recsweep-runner
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;

    Ok(())
}
