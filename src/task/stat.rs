use super::*;

/// the fields of `/proc/<pid>/task/<tid>/stat` that we care about.
///
/// see `proc_pid_stat(5)` for more information.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskStat {
    /// the filename of the executable, without its surrounding parentheses.
    pub comm: String,
    /// time scheduled in user mode plus time scheduled in kernel mode.
    pub cpu: Ticks,
    /// aggregated block i/o delays.
    pub blkio: Ticks,
}

// === impl TaskStat ===

impl TaskStat {
    /// 1-based field numbers, as documented in `proc_pid_stat(5)`.
    const UTIME: usize = 14;
    const STIME: usize = 15;
    const DELAYACCT_BLKIO_TICKS: usize = 42;

    /// fields before this one are consumed by the `pid (comm)` prefix.
    const FIRST_AFTER_COMM: usize = 3;

    fn field<'a>(fields: &[&'a str], number: usize) -> Option<&'a str> {
        fields.get(number - Self::FIRST_AFTER_COMM).copied()
    }

    fn ticks(fields: &[&str], number: usize, name: &'static str) -> Result<Ticks, ParseError> {
        Self::field(fields, number)
            .ok_or(ParseError::MissingField(name))?
            .parse::<Ticks>()
            .map_err(|source| ParseError::InvalidValue {
                field: name.to_owned(),
                source,
            })
    }
}

impl FromStr for TaskStat {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // the command may itself contain spaces or parentheses, so split around the outermost pair.
        let open = s.find('(').ok_or(ParseError::MalformedStat)?;
        let close = s.rfind(')').ok_or(ParseError::MalformedStat)?;
        if close < open {
            return Err(ParseError::MalformedStat);
        }

        let comm = s[open + 1..close].to_owned();
        let fields = s[close + 1..].split_whitespace().collect::<Vec<_>>();

        let utime = Self::ticks(&fields, Self::UTIME, "utime")?;
        let stime = Self::ticks(&fields, Self::STIME, "stime")?;

        // kernels without delay accounting may omit the field entirely.
        let blkio = match Self::field(&fields, Self::DELAYACCT_BLKIO_TICKS) {
            Some(_) => Self::ticks(&fields, Self::DELAYACCT_BLKIO_TICKS, "delayacct_blkio_ticks")?,
            None => Ticks::default(),
        };

        Ok(Self {
            comm,
            cpu: utime + stime,
            blkio,
        })
    }
}
