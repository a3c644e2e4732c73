use {
    crate::{
        rates::{RateSample, Rates},
        sample::ProcessId,
    },
    std::{collections::BTreeMap, rc::Rc},
};

/// the rates of every thread in a process, summed.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessAggregate {
    pub pid: ProcessId,
    /// the command of the first member thread encountered.
    pub command: Rc<str>,
    /// how many threads were folded into this record.
    pub threads: usize,
    pub rates: Rates,
}

/// collapses per-thread samples into one record per process.
///
/// the output is in no particular order.
pub fn aggregate_by_process(samples: &[RateSample]) -> Vec<ProcessAggregate> {
    samples
        .iter()
        .fold(BTreeMap::<ProcessId, ProcessAggregate>::new(), |mut groups, sample| {
            let RateSample { raw, rates } = sample;
            groups
                .entry(raw.pid)
                .and_modify(|group| group.absorb(rates))
                .or_insert_with(|| ProcessAggregate {
                    pid: raw.pid,
                    command: Rc::clone(&raw.command),
                    threads: 1,
                    rates: *rates,
                });
            groups
        })
        .into_values()
        .collect()
}

// === impl ProcessAggregate ===

impl ProcessAggregate {
    fn absorb(&mut self, rates: &Rates) {
        self.threads += 1;
        self.rates += *rates;
    }
}
