use std::{
    ops::{Add, Div},
    str::FromStr,
};

/// a count of kernel clock ticks.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Ticks(u64);

/// the number of clock ticks in a second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Hz(u64);

// === impl Ticks ===

impl Ticks {
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn get(self) -> u64 {
        let Self(ticks) = self;
        ticks
    }

    /// returns the ticks elapsed since `earlier`.
    ///
    /// a counter that appears to have gone backwards yields zero.
    pub const fn since(self, earlier: Self) -> Self {
        let (Self(now), Self(then)) = (self, earlier);
        Self(now.saturating_sub(then))
    }
}

impl FromStr for Ticks {
    type Err = <u64 as FromStr>::Err;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl Add for Ticks {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        let (Self(lhs), Self(rhs)) = (self, rhs);
        Self(lhs.saturating_add(rhs))
    }
}

/// converts ticks into seconds.
impl Div<Hz> for Ticks {
    type Output = f64;
    fn div(self, Hz(hz): Hz) -> Self::Output {
        let Self(ticks) = self;
        ticks as f64 / hz as f64
    }
}

// === impl Hz ===

impl Hz {
    /// the traditional `USER_HZ`, used when the system cannot tell us otherwise.
    pub const FALLBACK: Self = Self(100);

    /// returns a tick rate, substituting [`Hz::FALLBACK`] for zero.
    pub const fn new(hz: u64) -> Self {
        if hz == 0 { Self::FALLBACK } else { Self(hz) }
    }

    pub const fn get(self) -> u64 {
        let Self(hz) = self;
        hz
    }

    /// queries `sysconf(_SC_CLK_TCK)`.
    pub fn detect() -> Self {
        // SAFETY: `sysconf` has no preconditions; errors are reported as -1.
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        u64::try_from(hz).map(Self::new).unwrap_or(Self::FALLBACK)
    }
}

impl Default for Hz {
    fn default() -> Self {
        Self::detect()
    }
}
