use {
    crate::task::{IoCounters, TaskStat, Ticks},
    std::{
        fmt::{self, Display},
        ops::Not,
        rc::Rc,
    },
};

/// a kernel thread id.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ThreadId(pub u32);

/// a process id, i.e. the id of a thread group.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ProcessId(pub u32);

/// one snapshot of a thread's cumulative counters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawSample {
    pub tid: ThreadId,
    pub pid: ProcessId,
    /// the owning process's command line, shared by all of its threads.
    pub command: Rc<str>,
    /// read syscalls issued.
    pub syscr: u64,
    /// write syscalls issued.
    pub syscw: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// cpu time, user and system.
    pub cpu: Ticks,
    /// time spent blocked on block i/o.
    pub blkio: Ticks,
}

// === impl ThreadId ===

impl Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(tid) = self;
        Display::fmt(tid, f)
    }
}

// === impl ProcessId ===

impl ProcessId {
    /// returns the id of this process's primary thread.
    pub const fn primary_thread(self) -> ThreadId {
        let Self(pid) = self;
        ThreadId(pid)
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(pid) = self;
        Display::fmt(pid, f)
    }
}

// === impl RawSample ===

impl RawSample {
    /// commands are cut to this many bytes.
    pub const COMMAND_MAX: usize = 511;

    /// bounds a command line, so that it can be shared by a process's samples.
    pub fn share_command(command: String) -> Rc<str> {
        Self::bound(command).into()
    }

    /// assembles a sample from a task's accounting files.
    pub fn new(
        tid: ThreadId,
        pid: ProcessId,
        command: &Rc<str>,
        io: IoCounters,
        stat: &TaskStat,
    ) -> Self {
        let IoCounters {
            syscr,
            syscw,
            read_bytes,
            write_bytes,
        } = io;

        Self {
            tid,
            pid,
            command: Rc::clone(command),
            syscr,
            syscw,
            read_bytes,
            write_bytes,
            cpu: stat.cpu,
            blkio: stat.blkio,
        }
    }

    /// returns true if this is the primary thread of its process.
    pub fn is_primary(&self) -> bool {
        self.pid.primary_thread() == self.tid
    }

    fn bound(mut command: String) -> String {
        if command.len() > Self::COMMAND_MAX {
            let mut end = Self::COMMAND_MAX;
            while command.is_char_boundary(end).not() {
                end -= 1;
            }
            command.truncate(end);
        }
        command
    }
}
