//! terminal facilities.
//!
//! this wraps crossterm's raw mode and event polling behind a small [`Terminal`] trait, so that the
//! application loop can be driven by scripted input in tests.

use {
    crossterm::{
        ExecutableCommand, cursor,
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        terminal,
    },
    std::{
        collections::VecDeque,
        io::{self, IsTerminal},
        ops::Not,
        time::Duration,
    },
    tracing::warn,
};

/// an input event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Input {
    /// a character key. control chords arrive as their control code, e.g. `ctrl-a` is `'\x01'`.
    Key(char),
    /// `ctrl-c`. raw mode swallows the signal, so it is surfaced as an input instead.
    Interrupt,
    /// the terminal changed size.
    Resize,
    /// anything else: releases, mouse events, focus changes, and so on.
    Other,
}

/// an interactive terminal.
pub trait Terminal {
    /// waits up to `timeout` for a single input event.
    ///
    /// returns `Ok(None)` if the timeout elapsed without any input.
    fn wait_for_key(&mut self, timeout: Duration) -> io::Result<Option<Input>>;

    /// returns the width of the terminal, in columns.
    fn width(&self) -> u16;
}

/// a terminal backed by crossterm.
#[derive(Debug, Default)]
pub struct Crossterm;

/// holds the terminal in raw mode, restoring it when dropped.
#[derive(Debug)]
pub struct RawMode {
    enabled: bool,
}

/// a mock terminal that replays scripted input.
///
/// once the script runs out, every wait times out.
#[derive(Debug, Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockTerminal {
    script: VecDeque<Option<Input>>,
    width: u16,
    /// the timeouts that were waited on, in order.
    pub waits: Vec<Duration>,
}

// === impl Crossterm ===

impl Crossterm {
    /// the width reported when stdout is not a terminal.
    pub const FALLBACK_WIDTH: u16 = 120;

    /// maps a key press onto an [`Input`].
    fn input(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }: KeyEvent) -> Input {
        if kind == KeyEventKind::Release {
            return Input::Other;
        }

        match code {
            KeyCode::Char('c' | 'C') if modifiers.contains(KeyModifiers::CONTROL) => Input::Interrupt,
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) && c.is_ascii_alphabetic() => {
                // the control code for a letter is its position in the alphabet.
                let code = c.to_ascii_lowercase() as u8 - b'a' + 1;
                Input::Key(char::from(code))
            }
            KeyCode::Char(c) => Input::Key(c),
            _ => Input::Other,
        }
    }
}

impl Terminal for Crossterm {
    fn wait_for_key(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
        if event::poll(timeout)?.not() {
            return Ok(None);
        }

        let input = match event::read()? {
            Event::Key(key) => Self::input(key),
            Event::Resize(..) => Input::Resize,
            _ => Input::Other,
        };
        Ok(Some(input))
    }

    fn width(&self) -> u16 {
        if io::stdout().is_terminal().not() {
            return Self::FALLBACK_WIDTH;
        }

        match terminal::size() {
            Ok((cols, _)) if cols > 0 => cols,
            _ => Self::FALLBACK_WIDTH,
        }
    }
}

// === impl RawMode ===

impl RawMode {
    /// puts the terminal into raw mode and hides the cursor.
    ///
    /// if stdin is not a terminal, this does nothing.
    pub fn enable() -> io::Result<Self> {
        if io::stdin().is_terminal().not() {
            return Ok(Self { enabled: false });
        }

        terminal::enable_raw_mode()?;
        // from here on, dropping `mode` restores the terminal.
        let mode = Self { enabled: true };
        io::stdout().execute(cursor::Hide)?;
        Ok(mode)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// restores the terminal. calling this more than once is harmless.
    pub fn disable(&mut self) -> io::Result<()> {
        let Self { enabled } = self;

        if std::mem::take(enabled).not() {
            return Ok(());
        }

        let shown = io::stdout().execute(cursor::Show).map(drop);
        terminal::disable_raw_mode()?;
        shown
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(error) = self.disable() {
            warn!(%error, "failed to restore terminal");
        }
    }
}

// === impl MockTerminal ===

impl MockTerminal {
    pub fn new(width: u16, script: impl IntoIterator<Item = Option<Input>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            width,
            waits: Vec::new(),
        }
    }

    /// a script of key presses, each arriving before its wait times out.
    pub fn keys(width: u16, keys: &str) -> Self {
        Self::new(width, keys.chars().map(Input::Key).map(Some))
    }
}

impl Terminal for MockTerminal {
    fn wait_for_key(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
        self.waits.push(timeout);
        Ok(self.script.pop_front().flatten())
    }

    fn width(&self) -> u16 {
        self.width
    }
}
