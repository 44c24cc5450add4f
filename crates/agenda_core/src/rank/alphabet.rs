//! Dense index-to-rank mapping used when a topic is created.

use super::{Rank, ALPHABET_SIZE, MAX_SYMBOL, MIN_SYMBOL};

/// Number of letters in a fixed-width rank.
pub const FIXED_WIDTH: usize = 4;
/// Count of distinct fixed-width ranks (`26^4`).
pub const FIXED_CAPACITY: u64 = 456_976;
/// Longest rank produced for a supported index.
pub const MAX_RANK_LEN: usize = 1024;
/// Largest supported index; its rank is exactly [`MAX_RANK_LEN`] letters.
pub const MAX_INDEX: u64 =
    FIXED_CAPACITY + ALPHABET_SIZE as u64 * (MAX_RANK_LEN - FIXED_WIDTH) as u64 - 1;

/// Returns the rank for the `index`-th topic of a list.
///
/// Indices below [`FIXED_CAPACITY`] count in base 26 over four letters,
/// most-significant first (`0 -> "aaaa"`, `26 -> "aaba"`, `456975 -> "zzzz"`).
/// Larger indices continue as `"zzzz"`, then one `z` per full block of 26,
/// then a final letter for the remainder. The mapping is strictly increasing
/// across both encodings.
///
/// Overflow ranks grow by one letter per 26 indices, so indices above
/// [`MAX_INDEX`] yield ranks longer than [`MAX_RANK_LEN`]. Callers taking
/// untrusted indices reject those first.
pub fn rank_for_index(index: u64) -> Rank {
    let radix = u64::from(ALPHABET_SIZE);

    if index >= FIXED_CAPACITY {
        let overflow = index - FIXED_CAPACITY;
        let filler = (overflow / radix) as usize;
        let mut symbols = vec![MAX_SYMBOL; FIXED_WIDTH + filler];
        symbols.push(symbol_for(overflow % radix));
        return Rank::from_symbols(symbols);
    }

    let mut symbols = [MIN_SYMBOL; FIXED_WIDTH];
    let mut remaining = index;
    for slot in symbols.iter_mut().rev() {
        *slot = symbol_for(remaining % radix);
        remaining /= radix;
    }
    Rank::from_symbols(symbols.to_vec())
}

/// Returns the smallest fixed-width rank that sorts after `rank`.
///
/// `None` once `rank` is at or past `"zzzz"`.
pub fn fixed_rank_after(rank: &str) -> Option<Rank> {
    let index = fixed_index_of(rank.as_bytes());
    [index, index + 1]
        .into_iter()
        .filter(|candidate| *candidate < FIXED_CAPACITY)
        .map(rank_for_index)
        .find(|candidate| candidate.as_str() > rank)
}

/// Index of the fixed-width rank made of the first four letters, `a`-padded.
fn fixed_index_of(symbols: &[u8]) -> u64 {
    let radix = u64::from(ALPHABET_SIZE);
    (0..FIXED_WIDTH).fold(0, |index, position| {
        let symbol = symbols.get(position).copied().unwrap_or(MIN_SYMBOL);
        index * radix + u64::from(symbol.clamp(MIN_SYMBOL, MAX_SYMBOL) - MIN_SYMBOL)
    })
}

fn symbol_for(digit: u64) -> u8 {
    // digit < 26 at every call site
    MIN_SYMBOL + digit as u8
}
