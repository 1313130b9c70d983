use anyhow::bail;
use clap::{ArgAction, Parser, ValueEnum};
use core::{ops::Range, time::Duration};
use recsweep::Identifier;
use std::path::PathBuf;

/// Runtime configuration for the `recsweep-runner` binary.
///
/// Every setting can be given as a CLI flag or an environment variable
/// (optionally through a `.env` file). Defaults describe a small, fast, local
/// sweep writing to stdout.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "recsweep-runner",
    version,
    about = "Sweep a set of user IDs through a recommender and write the results as JSON lines"
)]
pub struct CliArgs {
    /// Number of worker threads.
    ///
    /// Defaults to the number of logical CPUs.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = num_cpus::get())]
    pub num_workers: usize,

    /// Number of recommended items requested per user.
    ///
    /// Environment variable: `RESULT_SIZE`
    #[arg(long, env = "RESULT_SIZE", default_value_t = 10)]
    pub result_size: usize,

    /// First user ID of the sweep. Ignored when `ID_FILE` is set.
    ///
    /// Environment variable: `ID_START`
    #[arg(long, env = "ID_START", default_value_t = 0)]
    pub id_start: Identifier,

    /// Number of consecutive user IDs to sweep. Ignored when `ID_FILE` is set.
    ///
    /// Environment variable: `ID_COUNT`
    #[arg(long, env = "ID_COUNT", default_value_t = 10_000)]
    pub id_count: u64,

    /// Newline-delimited file of user IDs. Blank lines and lines starting with
    /// `#` are skipped.
    ///
    /// Environment variable: `ID_FILE`
    #[arg(long, env = "ID_FILE")]
    pub id_file: Option<PathBuf>,

    /// How workers share the ID set.
    ///
    /// Environment variable: `SOURCE_KIND`
    #[arg(long, env = "SOURCE_KIND", value_enum, default_value_t = SourceKind::Lock)]
    pub source_kind: SourceKind,

    /// Output path for JSON lines, or `-` for stdout.
    ///
    /// Environment variable: `OUTPUT`
    #[arg(long, env = "OUTPUT", default_value_t = String::from("-"))]
    pub output: String,

    /// Artificial latency added to every recommendation, in milliseconds.
    ///
    /// Environment variable: `SIMULATED_LATENCY_MS`
    #[arg(long, env = "SIMULATED_LATENCY_MS", default_value_t = 0)]
    pub simulated_latency_ms: u64,

    /// Probability in `[0, 1]` that a recommendation fails.
    ///
    /// Environment variable: `FAILURE_RATE`
    #[arg(long, env = "FAILURE_RATE", default_value_t = 0.0)]
    pub failure_rate: f64,

    /// Number of distinct items the recommender chooses from.
    ///
    /// Environment variable: `CATALOG_SIZE`
    #[arg(long, env = "CATALOG_SIZE", default_value_t = 1_000)]
    pub catalog_size: u64,

    /// Log the average time, memory, and failure count once the sweep ends.
    ///
    /// Environment variable: `LOG_STATS`
    #[arg(long, env = "LOG_STATS", default_value_t = true, action = ArgAction::Set)]
    pub log_stats: bool,

    /// Seed for the synthetic recommender. Random when unset.
    ///
    /// Environment variable: `SEED`
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,
}

/// Which [`recsweep::IdSource`] backs the sweep.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Mutex-guarded cursor.
    Lock,
    /// Closed, pre-loaded channel.
    Channel,
}

/// Where user IDs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdInput {
    Range(Range<Identifier>),
    File(PathBuf),
}

/// Where results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub num_workers: usize,
    pub result_size: usize,
    pub ids: IdInput,
    pub source_kind: SourceKind,
    pub output: Output,
    pub latency: Duration,
    pub failure_rate: f64,
    pub catalog_size: u64,
    pub log_stats: bool,
    pub seed: u64,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.result_size == 0 {
            bail!("RESULT_SIZE must be greater than 0");
        }

        if args.catalog_size == 0 {
            bail!("CATALOG_SIZE must be greater than 0");
        }

        if args.result_size as u64 > args.catalog_size {
            bail!(
                "RESULT_SIZE ({}) exceeds CATALOG_SIZE ({})",
                args.result_size,
                args.catalog_size
            );
        }

        if !(0.0..=1.0).contains(&args.failure_rate) {
            bail!(
                "FAILURE_RATE ({}) must be between 0 and 1",
                args.failure_rate
            );
        }

        let ids = match args.id_file {
            Some(path) => IdInput::File(path),
            None => {
                let end = args.id_start.checked_add(args.id_count).ok_or_else(|| {
                    anyhow::anyhow!(
                        "ID_START ({}) + ID_COUNT ({}) overflows",
                        args.id_start,
                        args.id_count
                    )
                })?;
                IdInput::Range(args.id_start..end)
            }
        };

        let output = match args.output.as_str() {
            "-" => Output::Stdout,
            "" => bail!("OUTPUT must be a path or `-`"),
            path => Output::File(PathBuf::from(path)),
        };

        Ok(Self {
            num_workers: args.num_workers,
            result_size: args.result_size,
            ids,
            source_kind: args.source_kind,
            output,
            latency: Duration::from_millis(args.simulated_latency_ms),
            failure_rate: args.failure_rate,
            catalog_size: args.catalog_size,
            log_stats: args.log_stats,
            seed: args.seed.unwrap_or_else(rand::random),
        })
    }
}
