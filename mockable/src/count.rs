// vim: tw=80
//! Call count constraints used by verifications.

use std::{
    fmt::{self, Display},
    ops::{Range, RangeFrom, RangeInclusive, RangeToInclusive},
};

/// How many matching invocations a verification expects.
///
/// An integer converts into [`Count::Exactly`], and the inclusive range types
/// convert into the corresponding bounded constraints, so
/// `called(2)`, `called(1..=5)`, `called(3..)` and `called(..=4)` all work.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Count {
    Exactly(usize),
    Never,
    AtLeast(usize),
    AtMost(usize),
    /// Inclusive on both ends
    Between(usize, usize),
}

impl Count {
    pub fn never() -> Self {
        Count::Never
    }

    pub fn once() -> Self {
        Count::Exactly(1)
    }

    pub fn at_least_once() -> Self {
        Count::AtLeast(1)
    }

    pub fn between(lo: usize, hi: usize) -> Self {
        Count::Between(lo, hi)
    }

    pub fn at_least(n: usize) -> Self {
        Count::AtLeast(n)
    }

    /// Alias of [`at_least`](#method.at_least)
    pub fn more_or_equal(n: usize) -> Self {
        Count::AtLeast(n)
    }

    pub fn more_than(n: usize) -> Self {
        Count::AtLeast(n.saturating_add(1))
    }

    pub fn at_most(n: usize) -> Self {
        Count::AtMost(n)
    }

    /// Alias of [`at_most`](#method.at_most)
    pub fn less_or_equal(n: usize) -> Self {
        Count::AtMost(n)
    }

    /// Fewer than `n` calls.  `less_than(0)` can never be satisfied.
    pub fn less_than(n: usize) -> Self {
        match n.checked_sub(1) {
            Some(hi) => Count::AtMost(hi),
            None => Count::Between(1, 0),
        }
    }

    /// Is `actual` an acceptable number of calls?
    pub fn contains(&self, actual: usize) -> bool {
        match *self {
            Count::Exactly(n) => actual == n,
            Count::Never => actual == 0,
            Count::AtLeast(n) => actual >= n,
            Count::AtMost(n) => actual <= n,
            Count::Between(lo, hi) => lo <= actual && actual <= hi,
        }
    }
}

impl Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Count::Exactly(1) => write!(f, "exactly once"),
            Count::Exactly(n) => write!(f, "exactly {} times", n),
            Count::Never => write!(f, "never"),
            Count::AtLeast(n) => write!(f, "at least {} times", n),
            Count::AtMost(n) => write!(f, "at most {} times", n),
            Count::Between(lo, hi) =>
                write!(f, "between {} and {} times", lo, hi),
        }
    }
}

impl From<usize> for Count {
    fn from(n: usize) -> Self {
        Count::Exactly(n)
    }
}

impl From<RangeInclusive<usize>> for Count {
    fn from(range: RangeInclusive<usize>) -> Self {
        Count::Between(*range.start(), *range.end())
    }
}

/// Half-open ranges exclude their end: `0..1` means never.
impl From<Range<usize>> for Count {
    fn from(range: Range<usize>) -> Self {
        match range.end.checked_sub(1) {
            None | Some(0) if range.start == 0 => Count::Never,
            None => Count::Between(range.start, 0),
            Some(hi) => Count::Between(range.start, hi),
        }
    }
}

impl From<RangeFrom<usize>> for Count {
    fn from(range: RangeFrom<usize>) -> Self {
        Count::AtLeast(range.start)
    }
}

impl From<RangeToInclusive<usize>> for Count {
    fn from(range: RangeToInclusive<usize>) -> Self {
        Count::AtMost(range.end)
    }
}
