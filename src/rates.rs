use {
    crate::{
        sample::RawSample,
        snapshot::Snapshot,
        task::{Hz, Ticks},
    },
    std::ops::{Add, AddAssign},
};

/// bytes in a mebibyte.
const MIB: f64 = 1024.0 * 1024.0;

/// metrics derived from two samples of the same thread.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rates {
    /// cpu utilization, where 100.0 is one fully busy cpu.
    pub cpu_pct: f64,
    /// read syscalls per second.
    pub read_iops: f64,
    /// write syscalls per second.
    pub write_iops: f64,
    /// mebibytes read per second.
    pub read_mib: f64,
    /// mebibytes written per second.
    pub write_mib: f64,
    /// milliseconds spent waiting on block i/o during the interval.
    pub io_wait_ms: f64,
}

/// a [`RawSample`] decorated with its [`Rates`].
#[derive(Clone, Debug, PartialEq)]
pub struct RateSample {
    pub raw: RawSample,
    pub rates: Rates,
}

/// the difference between two [`RawSample`]s.
///
/// counters that went backwards are clamped to zero.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Delta {
    pub syscr: u64,
    pub syscw: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub cpu: Ticks,
    pub blkio: Ticks,
}

/// computes rates for every sample in `current`.
///
/// `previous` must be ordered. each rate sample carries a copy of its raw counters; the command
/// text is shared with `current`, not duplicated. threads absent from `previous` report zero rates. a non-positive
/// `elapsed` is replaced by `fallback`, the configured refresh interval.
pub fn compute_rates(
    current: &Snapshot,
    previous: &Snapshot,
    elapsed: f64,
    hz: Hz,
    fallback: f64,
) -> Vec<RateSample> {
    let elapsed = if elapsed > 0.0 && elapsed.is_finite() {
        elapsed
    } else {
        fallback
    };

    current
        .iter()
        .map(|c| {
            let delta = previous
                .lookup(c.tid)
                .map(|p| Delta::new(p, c))
                .unwrap_or_default();
            RateSample {
                raw: c.clone(),
                rates: Rates::new(delta, elapsed, hz),
            }
        })
        .collect()
}

// === impl Delta ===

impl Delta {
    pub fn new(a: &RawSample, b: &RawSample) -> Self {
        Self {
            syscr: b.syscr.saturating_sub(a.syscr),
            syscw: b.syscw.saturating_sub(a.syscw),
            read_bytes: b.read_bytes.saturating_sub(a.read_bytes),
            write_bytes: b.write_bytes.saturating_sub(a.write_bytes),
            cpu: b.cpu.since(a.cpu),
            blkio: b.blkio.since(a.blkio),
        }
    }
}

// === impl Rates ===

impl Rates {
    /// converts a delta observed over `elapsed` seconds into rates.
    ///
    /// `elapsed` must be positive.
    pub fn new(delta: Delta, elapsed: f64, hz: Hz) -> Self {
        let Delta {
            syscr,
            syscw,
            read_bytes,
            write_bytes,
            cpu,
            blkio,
        } = delta;

        Self {
            cpu_pct: 100.0 * (cpu / hz) / elapsed,
            read_iops: syscr as f64 / elapsed,
            write_iops: syscw as f64 / elapsed,
            read_mib: read_bytes as f64 / elapsed / MIB,
            write_mib: write_bytes as f64 / elapsed / MIB,
            io_wait_ms: 1000.0 * (blkio / hz),
        }
    }
}

impl Add for Rates {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for Rates {
    fn add_assign(&mut self, rhs: Self) {
        self.cpu_pct += rhs.cpu_pct;
        self.read_iops += rhs.read_iops;
        self.write_iops += rhs.write_iops;
        self.read_mib += rhs.read_mib;
        self.write_mib += rhs.write_mib;
        self.io_wait_ms += rhs.io_wait_ms;
    }
}

impl std::iter::Sum for Rates {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
