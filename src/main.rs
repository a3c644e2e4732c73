//! a compact per-thread i/o and cpu monitor.

use {
    anyhow::Context,
    clap::Parser,
    kvmtop::{
        App, Config,
        cli::Args,
        terminal::{Crossterm, RawMode},
    },
    std::{
        io::{self, BufWriter},
        ops::Not,
        thread,
        time::Duration,
    },
    tracing::{Level, info, level_filters::LevelFilter, warn},
    tracing_subscriber::{EnvFilter, fmt, prelude::*},
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.log_level.into());
    warn_unless_root();

    let mut app = App::new(Config::from(args));
    app.seed().context("failed to take the first snapshot")?;

    let mut mode = RawMode::enable().context("failed to prepare the terminal")?;
    let result = {
        let mut out = BufWriter::new(io::stdout().lock());
        app.run(&mut Crossterm, &mut out)
    };
    mode.disable().context("failed to restore the terminal")?;

    result.context("monitor failed")
}

/// logs to stderr. `RUST_LOG`, if set, overrides `level`.
fn setup_logging(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    info!(%level, "logging initialized");
}

/// other users' threads cannot be read without root, so they will be missing.
fn warn_unless_root() {
    const PAUSE: Duration = Duration::from_secs(2);

    // SAFETY: `geteuid` has no preconditions and cannot fail.
    let Some(warning) = root_warning(unsafe { libc::geteuid() }) else {
        return;
    };

    // pause so the warning can be read before the screen is cleared.
    if announce(warning) {
        thread::sleep(PAUSE);
    }
}

fn root_warning(euid: libc::uid_t) -> Option<&'static str> {
    (euid != 0).then_some("not running as root; threads of other users will be missing")
}

/// logs a warning, returning whether the log filter let it through.
fn announce(warning: &str) -> bool {
    if tracing::enabled!(Level::WARN).not() {
        return false;
    }

    warn!("{warning}");
    true
}
