use {
    crate::{
        aggregate::{ProcessAggregate, aggregate_by_process},
        rates::{RateSample, Rates, compute_rates},
        sample::ProcessId,
        snapshot::Snapshot,
        source::{Clock, CollectError, PidFilter, ProcFs, Provider, SystemClock},
        task::Hz,
    },
    std::time::{Duration, Instant},
    tracing::debug,
};

/// observes per-thread counters.
pub struct Sentinel<C = SystemClock, P = ProcFs> {
    /// the clock being used to measure time.
    clock: C,
    /// the underlying source of thread counters.
    provider: P,
    /// which processes to observe.
    filter: PidFilter,
    /// the kernel's clock tick rate.
    hz: Hz,
    /// the refresh interval, used when two snapshots share a timestamp.
    interval: Duration,
    /// the last observed snapshot, ordered for lookups.
    last: Option<Snapshot>,
}

/// the rates observed between two snapshots.
#[derive(Clone, Debug)]
pub struct Recording {
    /// when the recording began.
    pub start: Instant,
    /// when the recording ended.
    pub end: Instant,
    /// per-thread rates, in no particular order.
    pub threads: Vec<RateSample>,
    /// per-process rates, in no particular order.
    pub processes: Vec<ProcessAggregate>,
}

// === impl Sentinel ===

impl<C, P> Sentinel<C, P>
where
    C: Clock + Default,
    P: Provider + Default,
{
    /// creates a new [`Sentinel`].
    pub fn new(filter: PidFilter, interval: Duration) -> Self {
        Self::from_parts(C::default(), P::default(), filter, interval)
    }
}

impl<C, P> Sentinel<C, P>
where
    C: Clock,
    P: Provider,
{
    pub fn from_parts(clock: C, provider: P, filter: PidFilter, interval: Duration) -> Self {
        Self {
            clock,
            provider,
            filter,
            hz: Hz::detect(),
            interval,
            last: None,
        }
    }

    /// overrides the detected clock tick rate.
    pub fn with_hz(self, hz: Hz) -> Self {
        Self { hz, ..self }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// returns when the current baseline snapshot was taken, if one has been.
    pub fn baseline(&self) -> Option<Instant> {
        self.last.as_ref().map(Snapshot::time)
    }

    /// returns a [`Recording`] of thread activity since this was last called.
    ///
    /// NB: by virtue of this being a comparison to the previous reading, this will return
    /// `Ok(None)` the first time it is called.
    pub fn observe(&mut self) -> Result<Option<Recording>, CollectError> {
        let Self {
            clock,
            provider,
            filter,
            hz,
            interval,
            last,
        } = self;

        let mut current = Snapshot::read(&*provider, &*clock, &*filter)?;
        let Some(previous) = last.take() else {
            debug!(threads = current.len(), "seeded first snapshot");
            current.finalize_ordering();
            *last = Some(current);
            return Ok(None);
        };

        let (start, end) = (previous.time(), current.time());
        let elapsed = end.saturating_duration_since(start).as_secs_f64();
        let threads = compute_rates(&current, &previous, elapsed, *hz, interval.as_secs_f64());
        let processes = aggregate_by_process(&threads);
        debug!(
            threads = threads.len(),
            processes = processes.len(),
            elapsed,
            "observed"
        );

        // the current snapshot becomes the baseline for the next observation.
        current.finalize_ordering();
        *last = Some(current);

        Ok(Some(Recording {
            start,
            end,
            threads,
            processes,
        }))
    }
}

// === impl Recording ===

impl Recording {
    /// a recording of nothing, taken at `at`.
    pub fn empty(at: Instant) -> Self {
        Self {
            start: at,
            end: at,
            threads: Vec::new(),
            processes: Vec::new(),
        }
    }

    /// the sum of every thread's rates.
    pub fn totals(&self) -> Rates {
        self.threads.iter().map(|t| t.rates).sum()
    }

    /// returns the threads belonging to the given process.
    pub fn threads_of(&self, pid: ProcessId) -> impl Iterator<Item = &RateSample> {
        self.threads.iter().filter(move |t| t.raw.pid == pid)
    }
}
