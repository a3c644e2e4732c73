use std::{
    cell::{Cell, RefCell},
    collections::{BTreeSet, VecDeque},
    fs,
    io,
    ops::Not,
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

pub use self::{clock::*, filter::*, threads::*};

mod clock {
    use super::*;

    pub trait Clock {
        fn now(&self) -> Instant;
    }

    #[derive(Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> Instant {
            Instant::now()
        }
    }

    /// a mock clock that moves forward by a fixed step each time it is read.
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockClock {
        now: Cell<Instant>,
        step: Duration,
    }

    impl MockClock {
        pub fn new(step: Duration) -> Self {
            Self {
                now: Cell::new(Instant::now()),
                step,
            }
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new(Duration::from_millis(1))
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            let Self { now, step } = self;

            let current = now.get();
            now.set(current + *step);
            current
        }
    }
}

mod filter {
    use super::*;
    use crate::sample::ProcessId;

    /// an allow-list of processes. an empty filter admits everything.
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    pub struct PidFilter {
        pids: BTreeSet<ProcessId>,
    }

    // === impl PidFilter ===

    impl PidFilter {
        pub fn admits(&self, pid: ProcessId) -> bool {
            let Self { pids } = self;
            pids.is_empty() || pids.contains(&pid)
        }

        pub fn is_empty(&self) -> bool {
            self.pids.is_empty()
        }
    }

    impl FromIterator<ProcessId> for PidFilter {
        fn from_iter<I: IntoIterator<Item = ProcessId>>(iter: I) -> Self {
            Self {
                pids: iter.into_iter().collect(),
            }
        }
    }
}

/// abstracts over providers of thread counters.
mod threads {
    use {
        super::*,
        crate::{
            sample::{ProcessId, RawSample, ThreadId},
            task::TaskDir,
        },
        thiserror::Error,
        tracing::{debug, trace},
    };

    /// a source of per-thread counters.
    pub trait Provider {
        /// returns one sample per thread of every admitted process.
        ///
        /// threads that cannot be read are skipped. an error means that nothing could be read.
        fn collect(&self, filter: &PidFilter) -> Result<Vec<RawSample>, CollectError>;
    }

    #[derive(Debug, Error)]
    pub enum CollectError {
        #[error("cannot enumerate {}: {source}", path.display())]
        Unavailable {
            path: PathBuf,
            #[source]
            source: io::Error,
        },
    }

    /// threads backed by the proc filesystem.
    #[derive(Clone, Debug)]
    pub struct ProcFs {
        root: PathBuf,
    }

    /// a mock thread source.
    ///
    /// each call to [`Provider::collect()`] yields the next batch; the last batch repeats.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockProvider {
        batches: RefCell<VecDeque<Vec<RawSample>>>,
    }

    // === impl ProcFs ===

    impl Default for ProcFs {
        fn default() -> Self {
            Self::new(Self::PROC)
        }
    }

    impl ProcFs {
        const PROC: &str = "/proc";

        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        /// reads one thread, returning `None` if it is unreadable or has exited.
        fn sample(
            task: &TaskDir,
            tid: ThreadId,
            pid: ProcessId,
            command: &Rc<str>,
        ) -> Option<RawSample> {
            let read = || -> Result<RawSample, crate::task::ReadError> {
                let stat = task.stat()?;
                let io = task.io()?;
                Ok(RawSample::new(tid, pid, command, io, &stat))
            };

            read()
                .inspect_err(|error| debug!(%tid, %pid, %error, "skipping unreadable thread"))
                .ok()
        }

        /// returns a process's command line, or its bracketed `comm` if it has none.
        fn command(process: &TaskDir) -> Option<Rc<str>> {
            let command = match process.cmdline() {
                Ok(Some(cmdline)) => cmdline,
                Ok(None) => format!("[{}]", process.stat().ok()?.comm),
                Err(_) => return None,
            };
            Some(RawSample::share_command(command))
        }

        /// parses a directory entry name as a numeric id.
        fn numeric(entry: &fs::DirEntry) -> Option<u32> {
            let name = entry.file_name();
            let name = name.to_str()?;
            if name.bytes().all(|b| b.is_ascii_digit()).not() {
                return None;
            }
            name.parse().ok()
        }

        fn process(&self, pid: ProcessId, out: &mut Vec<RawSample>) {
            let process = TaskDir::new(self.root.join(pid.to_string()));
            let Some(command) = Self::command(&process) else {
                debug!(%pid, "skipping process without a readable command");
                return;
            };

            let tasks = match fs::read_dir(process.path().join("task")) {
                Ok(tasks) => tasks,
                Err(error) => {
                    // without a task directory, report the process as a single thread.
                    trace!(%pid, %error, "task directory unreadable");
                    out.extend(Self::sample(&process, pid.primary_thread(), pid, &command));
                    return;
                }
            };

            for entry in tasks.flatten() {
                let Some(tid) = Self::numeric(&entry).map(ThreadId) else {
                    continue;
                };
                let task = TaskDir::new(entry.path());
                out.extend(Self::sample(&task, tid, pid, &command));
            }
        }
    }

    impl Provider for ProcFs {
        fn collect(&self, filter: &PidFilter) -> Result<Vec<RawSample>, CollectError> {
            let Self { root } = self;

            let processes = fs::read_dir(root).map_err(|source| CollectError::Unavailable {
                path: root.clone(),
                source,
            })?;

            let mut samples = Vec::new();
            for entry in processes.flatten() {
                let Some(pid) = Self::numeric(&entry).map(ProcessId) else {
                    continue;
                };
                if filter.admits(pid).not() {
                    continue;
                }
                self.process(pid, &mut samples);
            }

            Ok(samples)
        }
    }

    // === impl MockProvider ===

    impl MockProvider {
        pub fn new(batches: impl IntoIterator<Item = Vec<RawSample>>) -> Self {
            Self {
                batches: RefCell::new(batches.into_iter().collect()),
            }
        }
    }

    impl Provider for MockProvider {
        fn collect(&self, filter: &PidFilter) -> Result<Vec<RawSample>, CollectError> {
            let Self { batches } = self;

            let mut batches = batches.borrow_mut();
            let batch = match batches.len() {
                0 => Vec::new(),
                1 => batches[0].clone(),
                _ => batches.pop_front().unwrap_or_default(),
            };

            Ok(batch.into_iter().filter(|s| filter.admits(s.pid)).collect())
        }
    }
}
