//! Base-26 interpolation between two existing ranks.
//!
//! Ranks are read as base-26 numerals (`a = 0`, `z = 25`) after right-padding
//! the shorter one with `a`. Digit vectors keep the arithmetic exact for ranks
//! of any length.

use super::alphabet::{fixed_rank_after, rank_for_index};
use super::{Rank, ALPHABET_SIZE, MAX_SYMBOL, MID_SYMBOL, MIN_SYMBOL};

/// Returns a rank that sorts strictly between `lower` and `upper`.
///
/// An empty string stands for an open boundary: `("", upper)` inserts at the
/// list head, `(lower, "")` at the tail, and `("", "")` seeds an empty list.
/// A tail insertion takes the next fixed-width rank after `lower`; past
/// `"zzzz"` it steps the last letter, adding a letter only when `lower` is
/// all `z`. Tail ranks are never longer than `lower` or four letters,
/// whichever is longer, unless `lower` is all `z`.
///
/// # Contract
/// - `lower` must sort before `upper` once both are padded with trailing `a`
///   (so `"a"`/`"aa"` is not a valid pair). Checked in debug builds only;
///   release builds return an arbitrary rank for invalid input.
/// - A head insertion before an all-`a` rank returns a shorter all-`a`
///   prefix. It sorts first but nothing fits between it and `upper`, so
///   persistent callers rebalance instead (see [`super::is_floor`]).
///   `"a"` itself cannot be preceded.
/// - The result is not necessarily the exact midpoint.
pub fn rank_between(lower: &str, upper: &str) -> Rank {
    match (lower.is_empty(), upper.is_empty()) {
        (true, true) => rank_for_index(0),
        (false, true) => rank_after(lower),
        (true, false) => rank_before(upper.as_bytes()),
        (false, false) => interpolate(lower.as_bytes(), upper.as_bytes()),
    }
}

fn rank_after(lower: &str) -> Rank {
    if let Some(rank) = fixed_rank_after(lower) {
        return rank;
    }
    let symbols = lower.as_bytes();
    if symbols.iter().all(|&symbol| symbol == MAX_SYMBOL) {
        let ceiling = vec![MAX_SYMBOL; symbols.len() + 1];
        return interpolate(symbols, &ceiling);
    }
    let digits = to_digits(symbols, symbols.len());
    let mut one = vec![0; digits.len()];
    if let Some(last) = one.last_mut() {
        *last = 1;
    }
    Rank::from_symbols(to_symbols(&add(&digits, &one)))
}

fn rank_before(upper: &[u8]) -> Rank {
    if upper.iter().any(|&symbol| symbol != MIN_SYMBOL) {
        let floor = vec![MIN_SYMBOL; upper.len()];
        return interpolate(&floor, upper);
    }
    debug_assert!(
        upper.len() > 1,
        "no rank sorts before the minimum rank `a`"
    );
    let keep = upper.len().saturating_sub(1).max(1);
    Rank::from_symbols(upper[..keep].to_vec())
}

fn interpolate(lower: &[u8], upper: &[u8]) -> Rank {
    let width = lower.len().max(upper.len());
    let lower_digits = to_digits(lower, width);
    let upper_digits = to_digits(upper, width);
    debug_assert!(
        lower_digits < upper_digits,
        "rank_between requires lower < upper, got `{}` and `{}`",
        String::from_utf8_lossy(lower),
        String::from_utf8_lossy(upper)
    );

    let difference = subtract(&upper_digits, &lower_digits);
    if at_most_one(&difference) {
        let mut symbols = to_symbols(&lower_digits);
        symbols.push(MID_SYMBOL);
        return Rank::from_symbols(symbols);
    }

    let offset = halve(&difference);
    Rank::from_symbols(to_symbols(&add(&lower_digits, &offset)))
}

fn to_digits(symbols: &[u8], width: usize) -> Vec<u8> {
    let mut digits: Vec<u8> = symbols
        .iter()
        .map(|&symbol| symbol.clamp(MIN_SYMBOL, MAX_SYMBOL) - MIN_SYMBOL)
        .collect();
    digits.resize(width, 0);
    digits
}

fn to_symbols(digits: &[u8]) -> Vec<u8> {
    digits.iter().map(|digit| MIN_SYMBOL + digit).collect()
}

/// `minuend - subtrahend`, most-significant digit first.
fn subtract(minuend: &[u8], subtrahend: &[u8]) -> Vec<u8> {
    let radix = i16::from(ALPHABET_SIZE);
    let mut result = vec![0; minuend.len()];
    let mut borrow = 0;
    for index in (0..minuend.len()).rev() {
        let mut digit = i16::from(minuend[index]) - i16::from(subtrahend[index]) - borrow;
        borrow = 0;
        if digit < 0 {
            digit += radix;
            borrow = 1;
        }
        result[index] = digit as u8;
    }
    result
}

fn add(left: &[u8], right: &[u8]) -> Vec<u8> {
    let mut result = vec![0; left.len()];
    let mut carry = 0;
    for index in (0..left.len()).rev() {
        let mut digit = left[index] + right[index] + carry;
        carry = 0;
        if digit >= ALPHABET_SIZE {
            digit -= ALPHABET_SIZE;
            carry = 1;
        }
        result[index] = digit;
    }
    result
}

/// Long division by two, most-significant digit first.
fn halve(digits: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(digits.len());
    let mut remainder = 0;
    for &digit in digits {
        let current = remainder * ALPHABET_SIZE + digit;
        result.push(current / 2);
        remainder = current % 2;
    }
    result
}

fn at_most_one(digits: &[u8]) -> bool {
    match digits.split_last() {
        Some((last, rest)) => *last <= 1 && rest.iter().all(|&digit| digit == 0),
        None => true,
    }
}
