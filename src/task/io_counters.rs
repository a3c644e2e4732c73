use super::*;

/// the i/o accounting of a task, as reported by `/proc/<pid>/task/<tid>/io`.
///
/// see `proc_pid_io(5)` for more information.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IoCounters {
    /// the number of read-like syscalls: `read(2)`, `pread(2)`, and friends.
    pub syscr: u64,
    /// the number of write-like syscalls: `write(2)`, `pwrite(2)`, and friends.
    pub syscw: u64,
    /// bytes this task caused to be fetched from the storage layer.
    pub read_bytes: u64,
    /// bytes this task caused to be sent to the storage layer.
    pub write_bytes: u64,
}

// === impl IoCounters ===

impl FromStr for IoCounters {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mut syscr, mut syscw, mut read_bytes, mut write_bytes) = (None, None, None, None);

        for line in s.lines().filter(|l| l.trim().is_empty().not()) {
            let (key, value) = line.split_once(':').ok_or(ParseError::MalformedIo)?;
            let slot = match key.trim() {
                "syscr" => &mut syscr,
                "syscw" => &mut syscw,
                "read_bytes" => &mut read_bytes,
                "write_bytes" => &mut write_bytes,
                // rchar, wchar, and cancelled_write_bytes are not tracked.
                _ => continue,
            };
            let value = value
                .trim()
                .parse::<u64>()
                .map_err(|source| ParseError::InvalidValue {
                    field: key.trim().to_owned(),
                    source,
                })?;
            slot.replace(value);
        }

        Ok(Self {
            syscr: syscr.ok_or(ParseError::MissingField("syscr"))?,
            syscw: syscw.ok_or(ParseError::MissingField("syscw"))?,
            read_bytes: read_bytes.ok_or(ParseError::MissingField("read_bytes"))?,
            write_bytes: write_bytes.ok_or(ParseError::MissingField("write_bytes"))?,
        })
    }
}
