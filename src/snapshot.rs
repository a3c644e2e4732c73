use {
    crate::{
        sample::{RawSample, ThreadId},
        source::{Clock, CollectError, PidFilter, Provider},
    },
    std::time::Instant,
};

/// a snapshot of every observed thread's counters at a moment in time.
///
/// samples are kept in the order they were inserted until [`Snapshot::finalize_ordering()`] sorts
/// them by thread id. lookups are only meaningful on a finalized snapshot.
#[derive(Clone, Debug)]
pub struct Snapshot {
    samples: Vec<RawSample>,
    time: Instant,
    ordered: bool,
}

// === impl Snapshot ===

impl Snapshot {
    /// returns an empty snapshot taken at `time`.
    pub fn new(time: Instant) -> Self {
        Self {
            samples: Vec::new(),
            time,
            ordered: true,
        }
    }

    /// uses the given provider to collect a snapshot of thread counters.
    ///
    /// the returned snapshot is not yet ordered.
    pub fn read(
        provider: &impl Provider,
        clock: &impl Clock,
        filter: &PidFilter,
    ) -> Result<Snapshot, CollectError> {
        let time = clock.now();
        let samples = provider.collect(filter)?;
        Ok(samples.into_iter().fold(Self::new(time), |mut snapshot, sample| {
            snapshot.insert(sample);
            snapshot
        }))
    }

    /// adds a sample.
    ///
    /// this invalidates the ordering; call [`Snapshot::finalize_ordering()`] before lookups.
    pub fn insert(&mut self, sample: RawSample) {
        let Self {
            samples, ordered, ..
        } = self;

        samples.push(sample);
        *ordered = false;
    }

    /// sorts the samples by thread id.
    pub fn finalize_ordering(&mut self) {
        let Self {
            samples, ordered, ..
        } = self;

        if *ordered {
            return;
        }
        samples.sort_unstable_by_key(|s| s.tid);
        *ordered = true;
    }

    /// finds the sample for the given thread.
    ///
    /// NB: the caller must have called [`Snapshot::finalize_ordering()`] since the last insert.
    pub fn lookup(&self, tid: ThreadId) -> Option<&RawSample> {
        let Self {
            samples, ordered, ..
        } = self;

        debug_assert!(*ordered, "lookup on a snapshot that has not been ordered");
        samples
            .binary_search_by_key(&tid, |s| s.tid)
            .ok()
            .map(|i| &samples[i])
    }

    /// returns when this snapshot was taken.
    pub fn time(&self) -> Instant {
        self.time
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawSample> {
        self.samples.iter()
    }
}
