use {
    crate::{aggregate::ProcessAggregate, rates::RateSample, rates::Rates},
    std::cmp::Ordering,
};

/// the column a view is sorted by. views are always sorted in descending order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortKey {
    /// the displayed id: a thread id for thread rows, a process id for process rows.
    Id,
    #[default]
    Cpu,
    ReadIops,
    WriteIops,
    ReadMib,
    WriteMib,
}

/// a row that can be sorted.
pub trait Row {
    fn display_id(&self) -> u32;
    fn rates(&self) -> &Rates;
}

/// sorts `rows` by `key`, highest first.
///
/// the relative order of rows that compare equal is unspecified.
pub fn sort_by<R: Row>(rows: &mut [R], key: SortKey) {
    rows.sort_by(|a, b| key.compare(b, a));
}

// === impl SortKey ===

impl SortKey {
    pub const ALL: [Self; 6] = [
        Self::Id,
        Self::Cpu,
        Self::ReadIops,
        Self::WriteIops,
        Self::ReadMib,
        Self::WriteMib,
    ];

    /// maps a sort key to its number on the keyboard, starting at one.
    pub fn number(self) -> u8 {
        match self {
            Self::Id => 1,
            Self::Cpu => 2,
            Self::ReadIops => 3,
            Self::WriteIops => 4,
            Self::ReadMib => 5,
            Self::WriteMib => 6,
        }
    }

    /// the column's name, as shown in headers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "PID",
            Self::Cpu => "CPU%",
            Self::ReadIops => "R_Sys",
            Self::WriteIops => "W_Sys",
            Self::ReadMib => "R_MiB/s",
            Self::WriteMib => "W_MiB/s",
        }
    }

    /// the inverse of [`SortKey::number()`].
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.number() == number)
    }

    /// compares two rows in ascending order.
    pub fn compare<R: Row>(self, a: &R, b: &R) -> Ordering {
        match self {
            Self::Id => a.display_id().cmp(&b.display_id()),
            metric => metric.metric(a.rates()).total_cmp(&metric.metric(b.rates())),
        }
    }

    fn metric(self, rates: &Rates) -> f64 {
        match self {
            Self::Id => 0.0,
            Self::Cpu => rates.cpu_pct,
            Self::ReadIops => rates.read_iops,
            Self::WriteIops => rates.write_iops,
            Self::ReadMib => rates.read_mib,
            Self::WriteMib => rates.write_mib,
        }
    }
}

// === impl RateSample ===

impl Row for RateSample {
    fn display_id(&self) -> u32 {
        self.raw.tid.0
    }

    fn rates(&self) -> &Rates {
        &self.rates
    }
}

// === impl ProcessAggregate ===

impl Row for ProcessAggregate {
    fn display_id(&self) -> u32 {
        self.pid.0
    }

    fn rates(&self) -> &Rates {
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::snapshot::tests::sample};

    fn row(tid: u32, rates: Rates) -> RateSample {
        RateSample {
            raw: sample(tid, tid),
            rates,
        }
    }

    fn cpu(tid: u32, cpu_pct: f64) -> RateSample {
        row(
            tid,
            Rates {
                cpu_pct,
                ..Rates::default()
            },
        )
    }

    fn cpus(rows: &[RateSample]) -> Vec<f64> {
        rows.iter().map(|r| r.rates.cpu_pct).collect()
    }

    #[test]
    fn sorts_by_cpu_descending() {
        let mut rows = [cpu(1, 1.0), cpu(2, 9.0), cpu(3, 5.0)];
        sort_by(&mut rows, SortKey::Cpu);
        assert_eq!(cpus(&rows), [9.0, 5.0, 1.0]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut rows = [cpu(1, 1.0), cpu(2, 9.0), cpu(3, 5.0), cpu(4, 7.0)];
        sort_by(&mut rows, SortKey::Cpu);
        let once = rows.clone();
        sort_by(&mut rows, SortKey::Cpu);
        assert_eq!(rows, once);
    }

    #[test]
    fn sorts_by_id_descending() {
        let mut rows = [cpu(3, 0.0), cpu(10, 0.0), cpu(7, 0.0)];
        sort_by(&mut rows, SortKey::Id);
        let ids = rows.iter().map(Row::display_id).collect::<Vec<_>>();
        assert_eq!(ids, [10, 7, 3]);
    }

    #[test]
    fn every_metric_sorts_its_column() {
        let rates = |v: f64| Rates {
            cpu_pct: v,
            read_iops: v,
            write_iops: v,
            read_mib: v,
            write_mib: v,
            io_wait_ms: v,
        };
        for key in SortKey::ALL {
            let mut rows = [row(1, rates(2.0)), row(2, rates(3.0)), row(3, rates(1.0))];
            sort_by(&mut rows, key);
            let first = rows[0].display_id();
            match key {
                SortKey::Id => assert_eq!(first, 3),
                _ => assert_eq!(first, 2, "{key:?}"),
            }
        }
    }

    #[test]
    fn nan_does_not_panic() {
        let mut rows = [cpu(1, f64::NAN), cpu(2, 1.0), cpu(3, 0.0)];
        sort_by(&mut rows, SortKey::Cpu);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn aggregates_sort_by_pid() {
        let aggregate = |pid: u32| ProcessAggregate {
            pid: crate::sample::ProcessId(pid),
            command: "".into(),
            threads: 1,
            rates: Rates::default(),
        };
        let mut rows = [aggregate(1), aggregate(300), aggregate(20)];
        sort_by(&mut rows, SortKey::Id);
        let pids = rows.iter().map(|r| r.pid.0).collect::<Vec<_>>();
        assert_eq!(pids, [300, 20, 1]);
    }

    #[test]
    fn numbers_round_trip() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_number(key.number()), Some(key));
        }
        assert_eq!(SortKey::from_number(0), None);
        assert_eq!(SortKey::from_number(7), None);
    }
}
