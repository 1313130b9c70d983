//! Building blocks of the `recsweep-runner` binary.
//!
//! - [`config`]: CLI and environment configuration.
//! - [`source`]: builds the shared ID source.
//! - [`computation`]: the synthetic recommender.
//! - [`sink`]: JSON lines output.
//! - [`telemetry`]: console logging.

pub mod computation;
pub mod config;
pub mod sink;
pub mod source;
pub mod telemetry;
