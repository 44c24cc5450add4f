//! Lexicographic rank keys for ordered topic lists.
//!
//! # Responsibility
//! - Assign dense initial ranks to sequentially created topics.
//! - Compute a rank strictly between two neighbors for reorder operations.
//! - Provide the owned, validated `Rank` value stored on topic rows.
//!
//! # Invariants
//! - Ranks use only `a`..`z` and compare with plain byte order.
//! - Within one meeting, `a.rank < b.rank` iff `a` displays before `b`.
//! - Both rank functions are pure; callers serialize persistence.
//!
//! # See also
//! - `repo::topic_repo` for the persisted create/move/list collaborators.

pub mod alphabet;
pub mod interpolate;

pub use alphabet::rank_for_index;
pub use interpolate::rank_between;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of symbols in the rank alphabet.
pub const ALPHABET_SIZE: u8 = 26;
/// Smallest rank symbol (digit value `0`).
pub const MIN_SYMBOL: u8 = b'a';
/// Largest rank symbol (digit value `25`).
pub const MAX_SYMBOL: u8 = b'z';
/// Symbol appended when two ranks are numerically adjacent.
pub const MID_SYMBOL: u8 = MIN_SYMBOL + ALPHABET_SIZE / 2;

/// Validation errors for rank strings read from untrusted sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    /// Rank string is empty.
    Empty,
    /// Rank contains a character outside `a`..`z`.
    InvalidSymbol { symbol: char, position: usize },
}

impl Display for RankError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "rank must not be empty"),
            Self::InvalidSymbol { symbol, position } => write!(
                f,
                "rank symbol `{symbol}` at position {position} is outside a..z"
            ),
        }
    }
}

impl Error for RankError {}

/// Opaque sort key for one topic within its meeting.
///
/// Ordering is the derived `String` ordering, i.e. byte-wise lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(String);

impl Rank {
    /// Parses and validates a rank string.
    ///
    /// # Errors
    /// - `RankError::Empty` for an empty input.
    /// - `RankError::InvalidSymbol` for any character outside `a`..`z`.
    pub fn parse(value: &str) -> Result<Self, RankError> {
        if value.is_empty() {
            return Err(RankError::Empty);
        }
        if let Some((position, symbol)) = value
            .chars()
            .enumerate()
            .find(|(_, symbol)| !symbol.is_ascii_lowercase())
        {
            return Err(RankError::InvalidSymbol { symbol, position });
        }
        Ok(Self(value.to_string()))
    }

    /// Wraps bytes produced by the rank arithmetic.
    ///
    /// Callers guarantee every byte is within `a`..`z`.
    pub(crate) fn from_symbols(symbols: Vec<u8>) -> Self {
        debug_assert!(symbols.iter().all(u8::is_ascii_lowercase));
        Self(symbols.into_iter().map(char::from).collect())
    }

    /// Returns the rank as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a rank strictly between `self` and `upper`.
    ///
    /// `self` must sort before `upper`; see [`rank_between`].
    pub fn between(&self, upper: &Rank) -> Rank {
        rank_between(self.as_str(), upper.as_str())
    }

    /// Consumes the rank and returns the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Rank {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks `lower < candidate < upper`, treating empty bounds as open.
pub fn is_strictly_between(lower: &str, candidate: &str, upper: &str) -> bool {
    let above_lower = lower.is_empty() || lower < candidate;
    let below_upper = upper.is_empty() || candidate < upper;
    !candidate.is_empty() && above_lower && below_upper
}

/// Returns whether `rank` is all `a`, i.e. numerically zero.
///
/// No rank can be interpolated in front of a floor rank.
pub fn is_floor(rank: &str) -> bool {
    !rank.is_empty() && rank.bytes().all(|symbol| symbol == MIN_SYMBOL)
}

/// Returns whether [`rank_between`] can place a rank between the bounds.
///
/// Bounds compare as if right-padded with `a`, so `"b"`/`"baa"` has no room.
pub fn has_room_between(lower: &str, upper: &str) -> bool {
    match (lower.is_empty(), upper.is_empty()) {
        (_, true) => true,
        (true, false) => upper != "a",
        (false, false) => lower.trim_end_matches('a') < upper.trim_end_matches('a'),
    }
}
