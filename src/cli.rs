//! command-line arguments.

use {
    crate::{app::Config, sample::ProcessId, source::PidFilter},
    clap::{Parser, ValueEnum},
    std::time::Duration,
    tracing::level_filters::LevelFilter,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

/// a compact per-thread i/o and cpu monitor.
///
/// keys: 1-6 (or ctrl-a through ctrl-f) pick the sort column, t toggles the thread tree, and q
/// quits.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// seconds between refreshes.
    #[arg(short, long, default_value = "5.0", value_parser = parse_interval)]
    pub interval: Duration,

    /// only show this process. may be repeated.
    #[arg(short, long = "pid", value_name = "PID")]
    pub pids: Vec<u32>,

    /// the most processes to list.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub limit: usize,

    /// start with threads listed beneath their process.
    #[arg(short, long)]
    pub tree: bool,

    /// diagnostics written to stderr. `RUST_LOG` takes precedence.
    #[arg(long, value_enum, default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
}

/// parses a refresh interval in seconds, which must be positive and finite.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let secs = s
        .parse::<f64>()
        .map_err(|error| format!("`{s}` is not a number: {error}"))?;

    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).map_err(|error| error.to_string())
    } else {
        Err(format!("`{s}` is not a positive number of seconds"))
    }
}

// === impl LogLevel ===

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::OFF,
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

// === impl Args ===

impl From<Args> for Config {
    fn from(
        Args {
            interval,
            pids,
            limit,
            tree,
            log_level: _,
        }: Args,
    ) -> Self {
        Self {
            interval,
            filter: pids.into_iter().map(ProcessId).collect::<PidFilter>(),
            limit,
            tree,
        }
    }
}
