//! per-task accounting files.
//!
//! this module parses the `io` and `stat` files that the kernel exposes for each task (thread)
//! under `/proc/<pid>/task/<tid>/`.

use {
    std::{
        fs,
        io,
        num::ParseIntError,
        ops::Not,
        path::{Path, PathBuf},
        str::FromStr,
    },
    thiserror::Error,
};

pub use self::{
    io_counters::IoCounters,
    stat::TaskStat,
    ticks::{Hz, Ticks},
};

mod io_counters;
mod stat;
mod ticks;


/// a task directory, e.g. `/proc/42/task/43`.
#[derive(Clone, Debug)]
pub struct TaskDir {
    path: PathBuf,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: ParseIntError,
    },
    #[error("malformed io line")]
    MalformedIo,
    #[error("malformed stat line")]
    MalformedStat,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

// === impl TaskDir ===

impl TaskDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// reads and parses the `io` file.
    pub fn io(&self) -> Result<IoCounters, ReadError> {
        self.read("io")
    }

    /// reads and parses the `stat` file.
    pub fn stat(&self) -> Result<TaskStat, ReadError> {
        self.read("stat")
    }

    /// reads `cmdline`, joining its nul-separated arguments with spaces.
    ///
    /// kernel threads have an empty command line, in which case this returns `Ok(None)`.
    pub fn cmdline(&self) -> Result<Option<String>, io::Error> {
        let raw = fs::read(self.path.join("cmdline"))?;
        let args = raw
            .split(|&b| b == 0)
            .filter(|arg| arg.is_empty().not())
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>();

        Ok(args.is_empty().not().then(|| args.join(" ")))
    }

    fn read<T>(&self, file: &str) -> Result<T, ReadError>
    where
        T: FromStr<Err = ParseError>,
    {
        let contents = fs::read_to_string(self.path.join(file))?;
        contents.parse::<T>().map_err(ReadError::from)
    }
}
