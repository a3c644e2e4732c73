use {
    crate::{
        sentinel::{Recording, Sentinel},
        sort::SortKey,
        source::{Clock, CollectError, PidFilter, ProcFs, Provider, SystemClock},
        terminal::{Input, Terminal},
        window::{Frame, View},
    },
    std::{
        io::{self, Write},
        ops::{ControlFlow, Not},
        time::{Duration, Instant},
    },
    thiserror::Error,
    tracing::{debug, info},
};

/// settings for an [`App`].
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// how often counters are sampled.
    pub interval: Duration,
    /// which processes to show.
    pub filter: PidFilter,
    /// the most processes to list.
    pub limit: usize,
    /// whether to start in tree mode.
    pub tree: bool,
}

/// the interactive monitor.
pub struct App<C = SystemClock, P = ProcFs> {
    sentinel: Sentinel<C, P>,
    view: View,
    interval: Duration,
    /// the latest rates, shown on the next redraw.
    recording: Recording,
    /// when the current sampling cycle began. `None` until seeded.
    cycle: Option<Instant>,
    /// whether the screen is stale.
    dirty: bool,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error("terminal i/o failed")]
    Io(#[from] io::Error),
}

// === impl Config ===

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            filter: PidFilter::default(),
            limit: View::default().limit,
            tree: false,
        }
    }
}

// === impl App ===

impl App {
    /// initializes a new application, reading from `/proc`.
    pub fn new(config: Config) -> Self {
        let sentinel = Sentinel::new(config.filter.clone(), config.interval);
        Self::from_sentinel(sentinel, config)
    }
}

impl<C, P> App<C, P>
where
    C: Clock,
    P: Provider,
{
    pub fn from_sentinel(sentinel: Sentinel<C, P>, config: Config) -> Self {
        let Config {
            interval,
            filter: _,
            limit,
            tree,
        } = config;

        let recording = Recording::empty(sentinel.clock().now());
        Self {
            sentinel,
            view: View {
                sort: SortKey::default(),
                tree,
                limit,
            },
            interval,
            recording,
            cycle: None,
            dirty: true,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// takes the first snapshot, which later samples are compared against.
    ///
    /// [`App::run()`] seeds the application itself if this has not been called.
    pub fn seed(&mut self) -> Result<(), Error> {
        self.sample()
    }

    /// runs the application until the user quits.
    ///
    /// the first cycle samples immediately, so the first screen already lists processes.
    pub fn run(&mut self, terminal: &mut impl Terminal, out: &mut impl Write) -> Result<(), Error> {
        info!(interval = ?self.interval, "starting");
        if self.cycle.is_none() {
            self.seed()?;
        }
        self.sample()?;

        loop {
            if self.dirty {
                self.render(terminal.width(), out)?;
            }

            let Some(remaining) = self.remaining() else {
                self.sample()?;
                continue;
            };

            match terminal.wait_for_key(remaining)? {
                None => self.sample()?,
                Some(input) => {
                    if let ControlFlow::Break(()) = self.handle(input) {
                        info!("quitting");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// collects a new snapshot, and begins a new cycle.
    fn sample(&mut self) -> Result<(), Error> {
        let Self {
            sentinel,
            recording,
            cycle,
            dirty,
            ..
        } = self;

        if let Some(observed) = sentinel.observe()? {
            *recording = observed;
            *dirty = true;
        }
        *cycle = Some(
            sentinel
                .baseline()
                .unwrap_or_else(|| sentinel.clock().now()),
        );

        Ok(())
    }

    /// returns how long remains in the current cycle, or `None` once it is over.
    fn remaining(&self) -> Option<Duration> {
        let Self {
            sentinel,
            interval,
            cycle,
            ..
        } = self;

        let start = (*cycle)?;
        let elapsed = sentinel.clock().now().saturating_duration_since(start);
        interval
            .checked_sub(elapsed)
            .filter(|remaining| remaining.is_zero().not())
    }

    fn render(&mut self, cols: u16, out: &mut impl Write) -> io::Result<()> {
        let Self {
            view,
            interval,
            recording,
            dirty,
            ..
        } = self;

        Frame::new(recording, *view, *interval, cols).draw(out)?;
        *dirty = false;
        Ok(())
    }

    /// applies one input event.
    fn handle(&mut self, input: Input) -> ControlFlow<()> {
        let Self { view, dirty, .. } = self;

        match input {
            Input::Key('q' | 'Q') | Input::Interrupt => return ControlFlow::Break(()),
            Input::Key('t' | 'T') => {
                view.tree = view.tree.not();
                *dirty = true;
            }
            Input::Key(key) => match Self::sort_key(key) {
                Some(sort) => {
                    view.sort = sort;
                    *dirty = true;
                }
                None => debug!(?key, "ignoring key"),
            },
            Input::Resize => *dirty = true,
            Input::Other => {}
        }

        ControlFlow::Continue(())
    }

    /// maps `1` through `6`, or `ctrl-a` through `ctrl-f`, onto a sort key.
    fn sort_key(key: char) -> Option<SortKey> {
        let number = match key {
            '1'..='6' => key as u8 - b'0',
            '\x01'..='\x06' => key as u8,
            _ => return None,
        };
        SortKey::from_number(number)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            sample::RawSample,
            snapshot::tests::sample,
            source::{MockClock, MockProvider},
            task::{Hz, Ticks},
            terminal::MockTerminal,
        },
    };

    fn app(batches: Vec<Vec<RawSample>>, step: Duration) -> App<MockClock, MockProvider> {
        let config = Config {
            interval: Duration::from_secs(1),
            ..Config::default()
        };
        let sentinel = Sentinel::from_parts(
            MockClock::new(step),
            MockProvider::new(batches),
            config.filter.clone(),
            config.interval,
        )
        .with_hz(Hz::new(100));
        App::from_sentinel(sentinel, config)
    }

    fn busy(tid: u32, pid: u32, cpu: u64) -> RawSample {
        RawSample {
            cpu: Ticks::new(cpu),
            ..sample(tid, pid)
        }
    }

    fn run(app: &mut App<MockClock, MockProvider>, terminal: &mut MockTerminal) -> String {
        let mut out = Vec::new();
        app.run(terminal, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn quits_on_q() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        let mut terminal = MockTerminal::keys(120, "Q");
        run(&mut app, &mut terminal);
        assert_eq!(terminal.waits.len(), 1);
    }

    #[test]
    fn quits_on_interrupt() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        let mut terminal = MockTerminal::new(120, [Some(Input::Interrupt)]);
        run(&mut app, &mut terminal);
        assert_eq!(terminal.waits.len(), 1);
    }

    #[test]
    fn toggles_tree_mode() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        let mut terminal = MockTerminal::keys(120, "tTtq");
        let out = run(&mut app, &mut terminal);
        assert!(app.view().tree);
        assert!(out.contains("Mode: Tree"));
    }

    #[test]
    fn selects_sort_keys() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        run(&mut app, &mut MockTerminal::keys(120, "3q"));
        assert_eq!(app.view().sort, SortKey::ReadIops);

        run(&mut app, &mut MockTerminal::keys(120, "\x06q"));
        assert_eq!(app.view().sort, SortKey::WriteMib);

        // unknown keys leave the view alone.
        run(&mut app, &mut MockTerminal::keys(120, "7x\x07q"));
        assert_eq!(app.view().sort, SortKey::WriteMib);
    }

    /// input never triggers sampling; only a timed out wait does.
    #[test]
    fn waits_are_bounded_by_the_cycle() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        let mut terminal = MockTerminal::keys(120, "xyq");
        run(&mut app, &mut terminal);

        // the clock steps 100ms on each read, and each wait re-reads it.
        assert_eq!(
            terminal.waits,
            [
                Duration::from_millis(900),
                Duration::from_millis(800),
                Duration::from_millis(700),
            ]
        );
        assert!(terminal.waits.iter().all(|w| *w <= Duration::from_secs(1)));
    }

    #[test]
    fn first_frame_lists_seeded_processes() {
        let mut app = app(vec![vec![sample(4242, 4242)]], Duration::from_millis(100));
        app.seed().unwrap();
        let mut terminal = MockTerminal::keys(120, "q");
        let out = run(&mut app, &mut terminal);

        assert_eq!(app.recording().processes.len(), 1);
        assert_eq!(out.matches("kvmtop - Refresh").count(), 1);
        assert!(out.contains("4242"));
    }

    #[test]
    fn timeouts_sample_again() {
        // the seed and the initial sample are idle; the sample after the timeout is busy.
        let mut app = app(
            vec![vec![busy(1, 1, 0)], vec![busy(1, 1, 0)], vec![busy(1, 1, 50)]],
            Duration::from_millis(500),
        );
        let mut terminal = MockTerminal::new(120, [None, Some(Input::Key('q'))]);
        let out = run(&mut app, &mut terminal);

        let totals = app.recording().totals();
        assert_eq!(totals.cpu_pct, 50.0);
        assert!(out.contains("50.00"));
    }

    #[test]
    fn cycles_expire_after_the_interval() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(600));
        assert_eq!(app.remaining(), None, "unseeded apps have no cycle");

        app.seed().unwrap();
        assert_eq!(app.remaining(), Some(Duration::from_millis(400)));
        // a cycle with no time left is over.
        assert_eq!(app.remaining(), None);
    }

    #[test]
    fn resize_redraws() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        let mut terminal = MockTerminal::new(120, [Some(Input::Resize), Some(Input::Key('q'))]);
        let out = run(&mut app, &mut terminal);
        assert_eq!(out.matches("kvmtop - Refresh").count(), 2);
    }

    #[test]
    fn ignored_input_does_not_redraw() {
        let mut app = app(vec![vec![sample(1, 1)]], Duration::from_millis(100));
        let mut terminal = MockTerminal::keys(120, "zq");
        let out = run(&mut app, &mut terminal);
        assert_eq!(out.matches("kvmtop - Refresh").count(), 1);
    }

    #[test]
    fn collection_failures_are_fatal() {
        struct Broken;
        impl Provider for Broken {
            fn collect(&self, _: &PidFilter) -> Result<Vec<RawSample>, CollectError> {
                Err(CollectError::Unavailable {
                    path: "/proc".into(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                })
            }
        }

        let sentinel = Sentinel::from_parts(
            MockClock::default(),
            Broken,
            PidFilter::default(),
            Duration::from_secs(1),
        );
        let mut app = App::from_sentinel(sentinel, Config::default());
        assert!(matches!(app.seed(), Err(Error::Collect(_))));
    }
}
