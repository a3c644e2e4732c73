use {
    crate::{
        rates::{RateSample, Rates},
        sample::ProcessId,
        sentinel::Recording,
        sort::{Row, SortKey, sort_by},
    },
    crossterm::{
        QueueableCommand, cursor,
        style::{self, Stylize},
        terminal,
    },
    std::{
        collections::BTreeMap,
        io::{self, Write},
        iter::repeat_n,
        ops::Not,
        time::Duration,
    },
};

/// what the dashboard shows, and how.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct View {
    /// the column that rows are sorted by.
    pub sort: SortKey,
    /// whether threads are listed beneath their process.
    pub tree: bool,
    /// the most processes to list.
    pub limit: usize,
}

/// column widths for a terminal of a given width.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    cols: usize,
    command: usize,
}

/// one line of the dashboard.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    Title(String),
    Header(String),
    Rule(String),
    Process(String),
    Thread(String),
    Total(String),
}

/// a fully laid out dashboard.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame {
    pub lines: Vec<Line>,
}

/// fits `s` into exactly `width` columns, marking truncation with an ellipsis.
pub fn truncate(s: &str, width: usize) -> String {
    const ELLIPSIS: &str = "...";

    let len = s.chars().count();
    if len <= width {
        format!("{s:<width$}")
    } else if width <= ELLIPSIS.len() {
        s.chars().take(width).collect()
    } else {
        let kept = s.chars().take(width - ELLIPSIS.len());
        kept.chain(ELLIPSIS.chars()).collect()
    }
}

// === impl View ===

impl Default for View {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            tree: false,
            limit: 50,
        }
    }
}

// === impl Layout ===

impl Layout {
    const ID: usize = 14;
    const CPU: usize = 8;
    const IOPS: usize = 10;
    const WAIT: usize = 10;
    const MIB: usize = 10;
    /// the narrowest the command column may become.
    const MIN_COMMAND: usize = 10;

    pub fn new(cols: u16) -> Self {
        let cols = usize::from(cols);
        let fixed = [
            Self::ID,
            Self::CPU,
            Self::IOPS,
            Self::IOPS,
            Self::WAIT,
            Self::MIB,
            Self::MIB,
        ]
        .iter()
        .map(|w| w + 1)
        .sum::<usize>();

        Self {
            cols,
            command: cols.saturating_sub(fixed).max(Self::MIN_COMMAND),
        }
    }

    pub fn command_width(&self) -> usize {
        self.command
    }

    fn columns(&self, id: &str, rates: &Rates) -> String {
        let Rates {
            cpu_pct,
            read_iops,
            write_iops,
            read_mib,
            write_mib,
            io_wait_ms,
        } = rates;

        format!(
            "{id:>id_w$} {cpu_pct:>cpu_w$.2} {read_iops:>iops_w$.2} {write_iops:>iops_w$.2} \
             {io_wait_ms:>wait_w$.2} {read_mib:>mib_w$.2} {write_mib:>mib_w$.2} ",
            id_w = Self::ID,
            cpu_w = Self::CPU,
            iops_w = Self::IOPS,
            wait_w = Self::WAIT,
            mib_w = Self::MIB,
        )
    }

    fn header(&self, sort: SortKey) -> String {
        // the active sort column is marked with an asterisk.
        let name = |key: SortKey| {
            let mark = if key == sort { "*" } else { "" };
            format!("{mark}{}", key.name())
        };

        format!(
            "{:>id_w$} {:>cpu_w$} {:>iops_w$} {:>iops_w$} {:>wait_w$} {:>mib_w$} {:>mib_w$} {}",
            name(SortKey::Id),
            name(SortKey::Cpu),
            name(SortKey::ReadIops),
            name(SortKey::WriteIops),
            "IO_Wait",
            name(SortKey::ReadMib),
            name(SortKey::WriteMib),
            truncate("COMMAND", self.command),
            id_w = Self::ID,
            cpu_w = Self::CPU,
            iops_w = Self::IOPS,
            wait_w = Self::WAIT,
            mib_w = Self::MIB,
        )
    }

    fn rule(&self) -> String {
        repeat_n('-', self.cols).collect()
    }
}

// === impl Line ===

impl Line {
    pub fn text(&self) -> &str {
        match self {
            Self::Title(s)
            | Self::Header(s)
            | Self::Rule(s)
            | Self::Process(s)
            | Self::Thread(s)
            | Self::Total(s) => s,
        }
    }

    fn styled(&self) -> style::StyledContent<&str> {
        match self {
            Self::Title(s) => s.as_str().bold(),
            Self::Header(s) => s.as_str().reverse(),
            Self::Rule(s) => s.as_str().dark_grey(),
            Self::Process(s) => s.as_str().reset(),
            Self::Thread(s) => s.as_str().grey(),
            Self::Total(s) => s.as_str().green(),
        }
    }
}

// === impl Frame ===

impl Frame {
    /// lays out a recording.
    ///
    /// this sorts the recording's processes, and in tree mode its threads, by the view's key.
    pub fn new(recording: &mut Recording, view: View, interval: Duration, cols: u16) -> Self {
        let View { sort, tree, limit } = view;
        let layout = Layout::new(cols);
        let mut lines = Vec::new();

        lines.push(Line::Title(format!(
            "kvmtop - Refresh={:.1}s | Mode: {} ('t' to toggle) | Sort: {}",
            interval.as_secs_f64(),
            if tree { "Tree" } else { "List" },
            Self::indicators(sort),
        )));
        lines.push(Line::Header(layout.header(sort)));
        lines.push(Line::Rule(layout.rule()));

        let totals = recording.totals();
        let Recording {
            threads, processes, ..
        } = recording;
        sort_by(processes, sort);

        let mut members = if tree {
            Self::group(threads)
        } else {
            BTreeMap::new()
        };

        for process in processes.iter().take(limit) {
            let id = process.pid.to_string();
            lines.push(Line::Process(format!(
                "{}{}",
                layout.columns(&id, &process.rates),
                truncate(&process.command, layout.command),
            )));

            let Some(threads) = members.get_mut(&process.pid) else {
                continue;
            };
            sort_by(threads, sort);
            for thread in threads.iter() {
                let id = format!("  └─ {}", thread.raw.tid);
                lines.push(Line::Thread(format!(
                    "{}{}",
                    layout.columns(&id, &thread.rates),
                    truncate(&thread.raw.command, layout.command),
                )));
            }
        }

        lines.push(Line::Rule(layout.rule()));
        lines.push(Line::Total(layout.columns("TOTAL", &totals)));

        Self { lines }
    }

    /// the sort keys and their numbers, with the active key bracketed.
    fn indicators(sort: SortKey) -> String {
        SortKey::ALL
            .iter()
            .map(|&key| {
                let (open, close) = if key == sort { ('[', ']') } else { (' ', ' ') };
                format!("{open}{}:{}{close}", key.number(), key.name())
            })
            .collect()
    }

    /// groups the non-primary threads of each process; the process row already covers its
    /// primary thread.
    fn group(threads: &[RateSample]) -> BTreeMap<ProcessId, Vec<&RateSample>> {
        threads
            .iter()
            .filter(|t| t.raw.is_primary().not())
            .fold(BTreeMap::new(), |mut groups, thread| {
                groups
                    .entry(thread.raw.pid)
                    .or_insert_with(Vec::new)
                    .push(thread);
                groups
            })
    }

    /// redraws the whole screen.
    pub fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        out.queue(terminal::Clear(terminal::ClearType::All))?
            .queue(cursor::MoveTo(0, 0))?;

        for line in &self.lines {
            out.queue(style::PrintStyledContent(line.styled()))?
                .queue(cursor::MoveToNextLine(1))?;
        }

        out.flush()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(Line::text)
    }
}

// === impl Row for &R ===

impl<R: Row> Row for &R {
    fn display_id(&self) -> u32 {
        R::display_id(self)
    }

    fn rates(&self) -> &Rates {
        R::rates(self)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{aggregate::aggregate_by_process, sample::RawSample, snapshot::tests::sample},
        std::time::Instant,
    };

    fn thread(tid: u32, pid: u32, cpu_pct: f64, command: &str) -> RateSample {
        RateSample {
            raw: RawSample {
                command: command.into(),
                ..sample(tid, pid)
            },
            rates: Rates {
                cpu_pct,
                ..Rates::default()
            },
        }
    }

    fn recording(threads: Vec<RateSample>) -> Recording {
        let processes = aggregate_by_process(&threads);
        let now = Instant::now();
        Recording {
            start: now,
            end: now,
            threads,
            processes,
        }
    }

    fn fixture() -> Recording {
        recording(vec![
            thread(10, 10, 1.0, "small"),
            thread(20, 20, 4.0, "big"),
            thread(21, 20, 3.0, "big"),
            thread(22, 20, 2.0, "big"),
            thread(30, 30, 5.0, "medium"),
        ])
    }

    fn processes(frame: &Frame) -> Vec<&str> {
        frame
            .lines
            .iter()
            .filter_map(|l| match l {
                Line::Process(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn truncate_pads_short_text() {
        assert_eq!(truncate("abc", 6), "abc   ");
        assert_eq!(truncate("abcdef", 6), "abcdef");
    }

    #[test]
    fn truncate_marks_long_text() {
        assert_eq!(truncate("abcdefgh", 6), "abc...");
        assert_eq!(truncate("abcdefgh", 3), "abc");
        assert_eq!(truncate("abcdefgh", 0), "");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn narrow_terminals_keep_a_command_column() {
        assert_eq!(Layout::new(20).command_width(), Layout::MIN_COMMAND);
        assert_eq!(Layout::new(0).command_width(), Layout::MIN_COMMAND);
        assert_eq!(Layout::new(120).command_width(), 120 - 79);
    }

    #[test]
    fn processes_are_sorted_and_summed() {
        let mut recording = fixture();
        let frame = Frame::new(&mut recording, View::default(), Duration::from_secs(5), 120);
        let rows = processes(&frame);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].trim_start().starts_with("20 "), "{}", rows[0]);
        assert!(rows[0].contains("9.00"));
        assert!(rows[1].trim_start().starts_with("30 "));
        assert!(rows[2].trim_start().starts_with("10 "));
    }

    #[test]
    fn sort_by_id() {
        let mut recording = fixture();
        let view = View {
            sort: SortKey::Id,
            ..View::default()
        };
        let frame = Frame::new(&mut recording, view, Duration::from_secs(5), 120);
        let ids = processes(&frame)
            .iter()
            .map(|r| r.split_whitespace().next().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["30", "20", "10"]);
    }

    #[test]
    fn limit_caps_process_rows() {
        let mut recording = fixture();
        let view = View {
            limit: 1,
            ..View::default()
        };
        let frame = Frame::new(&mut recording, view, Duration::from_secs(5), 120);
        assert_eq!(processes(&frame).len(), 1);
    }

    #[test]
    fn tree_mode_lists_worker_threads() {
        let mut recording = fixture();
        let view = View {
            tree: true,
            ..View::default()
        };
        let frame = Frame::new(&mut recording, view, Duration::from_secs(5), 120);
        let texts = frame.texts().collect::<Vec<_>>();
        let big = texts
            .iter()
            .position(|t| t.trim_start().starts_with("20 "))
            .unwrap();
        assert!(texts[big + 1].contains("└─ 21"));
        assert!(texts[big + 2].contains("└─ 22"));
        assert!(texts[big + 3].contains("└─").not());

        let threads = frame
            .lines
            .iter()
            .filter(|l| matches!(l, Line::Thread(_)))
            .count();
        assert_eq!(threads, 2);
    }

    #[test]
    fn list_mode_hides_threads() {
        let mut recording = fixture();
        let frame = Frame::new(&mut recording, View::default(), Duration::from_secs(5), 120);
        assert!(frame.lines.iter().all(|l| matches!(l, Line::Thread(_)).not()));
    }

    #[test]
    fn totals_sum_every_thread() {
        let mut recording = fixture();
        let view = View {
            limit: 1,
            ..View::default()
        };
        let frame = Frame::new(&mut recording, view, Duration::from_secs(5), 120);
        let Some(Line::Total(total)) = frame.lines.last() else {
            panic!("last line should be the totals row");
        };
        assert!(total.contains("TOTAL"));
        assert!(total.contains("15.00"));
    }

    #[test]
    fn header_marks_active_sort() {
        let layout = Layout::new(120);
        assert!(layout.header(SortKey::Cpu).contains("*CPU%"));
        assert!(layout.header(SortKey::Cpu).contains("*PID").not());
        assert!(layout.header(SortKey::WriteMib).contains("*W_MiB/s"));
    }

    #[test]
    fn title_lists_sort_keys() {
        let indicators = Frame::indicators(SortKey::ReadIops);
        assert!(indicators.contains("[3:R_Sys]"));
        assert!(indicators.contains(" 1:PID "));
        assert!(indicators.contains(" 6:W_MiB/s "));
    }

    /// every column header fits its column.
    #[test]
    fn header_aligns_with_rows() {
        let layout = Layout::new(120);
        for key in SortKey::ALL {
            let header = layout.header(key);
            assert_eq!(header.chars().count(), 120, "{header}");
        }
    }

    #[test]
    fn long_commands_are_truncated() {
        let long = "x".repeat(200);
        let mut recording = recording(vec![thread(1, 1, 0.0, &long)]);
        let frame = Frame::new(&mut recording, View::default(), Duration::from_secs(1), 100);
        let row = processes(&frame)[0];
        assert!(row.ends_with("..."));
        assert_eq!(row.chars().count(), 100);
    }

    #[test]
    fn draw_writes_every_line() {
        let mut recording = fixture();
        let frame = Frame::new(&mut recording, View::default(), Duration::from_secs(5), 120);
        let mut out = Vec::new();
        frame.draw(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("kvmtop - Refresh=5.0s"));
        assert!(out.contains("TOTAL"));
    }
}
