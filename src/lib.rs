//! a compact per-thread i/o and cpu monitor.
//!
//! counters are read from `/proc/<pid>/task/<tid>/{io,stat}` once per interval, turned into
//! per-second rates, and summed per process.

pub use self::{
    aggregate::{ProcessAggregate, aggregate_by_process},
    app::{App, Config, Error},
    rates::{RateSample, Rates, compute_rates},
    sample::{ProcessId, RawSample, ThreadId},
    sentinel::{Recording, Sentinel},
    snapshot::Snapshot,
    sort::{Row, SortKey, sort_by},
};

/// groups per-thread rates by process.
pub mod aggregate;
/// the interactive loop.
pub mod app;
pub mod cli;
/// turns two snapshots into per-second rates.
pub mod rates;
pub mod sample;
/// observes the system over time.
pub mod sentinel;
/// an ordered collection of samples taken at one moment.
pub mod snapshot;
pub mod sort;
/// sources of thread counters, and of time.
pub mod source;
pub mod task;
pub mod terminal;
/// draws the dashboard.
pub mod window;
