//! Byte and index pattern generation.
//!
//! Character patterns are used to fill buffers and to locate offsets after a
//! value from a pattern has been observed somewhere else. Index patterns
//! ([`fibonacci_indices`], [`prime_indices`]) choose which slots of an
//! allocation group become holes.
//!
//! All functions are pure. The random variants draw from a caller-supplied
//! [`RngCore`], so a seeded [`Rng`](crate::util::Rng) reproduces them exactly.

use crate::util::Endianness;
use rand::{Rng as _, RngCore};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Alphabet of the cyclic and alphanumeric patterns.
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const LETTERS: u8 = 26;
/// First printable, non-space ASCII character.
const PRINTABLE_START: u8 = 33;
const PRINTABLE_LEN: u32 = 94;
/// Code points drawn by [`unicode`] lie in the basic multilingual plane.
const BMP_LEN: u32 = 0x10000;

/// Kind of character pattern produced by [`generate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Repeats the alphanumeric alphabet
    #[default]
    Cyclic,
    /// `A..Z` repeated in ascending order
    Increasing,
    /// [`PatternKind::Increasing`] read backwards
    Decreasing,
    /// Random printable ASCII
    Random,
    /// Random alphanumeric characters
    Alphanumeric,
    /// Random characters from the basic multilingual plane
    Unicode,
}

impl FromStr for PatternKind {
    type Err = Infallible;

    /// Unknown kinds fall back to [`PatternKind::Cyclic`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "increasing" => PatternKind::Increasing,
            "decreasing" => PatternKind::Decreasing,
            "random" => PatternKind::Random,
            "alphanumeric" => PatternKind::Alphanumeric,
            "unicode" => PatternKind::Unicode,
            "cyclic" => PatternKind::Cyclic,
            other => {
                log::debug!("Unknown pattern kind {:?}, using cyclic", other);
                PatternKind::Cyclic
            }
        })
    }
}

/// Generates a pattern of `length` characters of the given kind.
pub fn generate<R: RngCore>(kind: PatternKind, length: usize, rng: &mut R) -> String {
    match kind {
        PatternKind::Cyclic => cyclic(length),
        PatternKind::Increasing => increasing(length),
        PatternKind::Decreasing => decreasing(length),
        PatternKind::Random => random(length, rng),
        PatternKind::Alphanumeric => alphanumeric(length, rng),
        PatternKind::Unicode => unicode(length, rng),
    }
}

/// Repeats `A..Za..z0..9`. `cyclic(n)` is always a prefix of `cyclic(n + 1)`.
pub fn cyclic(length: usize) -> String {
    (0..length)
        .map(|i| ALPHANUMERIC[i % ALPHANUMERIC.len()] as char)
        .collect()
}

/// Uppercase letters in ascending order, wrapping after `Z`.
pub fn increasing(length: usize) -> String {
    (0..length).map(letter).collect()
}

/// The reverse of [`increasing`] of the same length.
pub fn decreasing(length: usize) -> String {
    (0..length).rev().map(letter).collect()
}

fn letter(i: usize) -> char {
    (b'A' + (i % LETTERS as usize) as u8) as char
}

/// Random printable ASCII characters (`!` to `~`).
pub fn random<R: RngCore>(length: usize, rng: &mut R) -> String {
    (0..length)
        .map(|_| (PRINTABLE_START + rng.random_range(0..PRINTABLE_LEN) as u8) as char)
        .collect()
}

/// Random characters from `A..Za..z0..9`.
pub fn alphanumeric<R: RngCore>(length: usize, rng: &mut R) -> String {
    (0..length)
        .map(|_| ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

/// `length` random characters from the basic multilingual plane.
///
/// Surrogate code points have no `char` representation and become U+FFFD.
pub fn unicode<R: RngCore>(length: usize, rng: &mut R) -> String {
    (0..length)
        .map(|_| {
            char::from_u32(rng.random_range(0..BMP_LEN)).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect()
}

/// Fibonacci numbers below `max`, starting `1, 1`.
///
/// The leading duplicate is kept.
///
/// ```
/// use fuller_core::pattern::fibonacci_indices;
///
/// assert_eq!(fibonacci_indices(20), vec![1, 1, 2, 3, 5, 8, 13]);
/// ```
pub fn fibonacci_indices(max: usize) -> Vec<usize> {
    let mut fib = vec![1usize, 1];
    loop {
        let (a, b) = (fib[fib.len() - 2], fib[fib.len() - 1]);
        if b >= max {
            break;
        }
        match a.checked_add(b) {
            Some(next) => fib.push(next),
            None => break,
        }
    }
    fib.retain(|&n| n < max);
    fib
}

/// Primes in `[2, max)` in ascending order (sieve of Eratosthenes).
pub fn prime_indices(max: usize) -> Vec<usize> {
    let mut primes = vec![];
    let mut sieve = vec![true; max];
    for i in 2..max {
        if sieve[i] {
            primes.push(i);
            for j in (i.saturating_mul(i)..max).step_by(i) {
                sieve[j] = false;
            }
        }
    }
    primes
}

/// Finds the first occurrence of `needle` in `haystack`.
///
/// `needle` is given in written order (most significant byte first). With
/// [`Endianness::Little`] it is reversed before searching, matching how the
/// value is laid out in memory on little-endian targets.
///
/// Returns `None` when the needle is empty, longer than the haystack, or absent.
/// A [`cyclic`] pattern repeats every 62 bytes, so offsets found in it are
/// only unique modulo 62.
pub fn find_offset(haystack: &[u8], needle: &[u8], endianness: Endianness) -> Option<usize> {
    let needle: Vec<u8> = match endianness {
        Endianness::Little => needle.iter().rev().copied().collect(),
        Endianness::Big => needle.to_vec(),
    };
    find_subsequence(haystack, &needle)
}

/// Finds a 32-bit value (e.g. from a register dump) in `haystack`.
pub fn find_value_offset(haystack: &[u8], value: u32, endianness: Endianness) -> Option<usize> {
    find_offset(haystack, &value.to_be_bytes(), endianness)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Rng;

    #[test]
    fn cyclic_starts_with_alphabet() {
        assert_eq!(cyclic(5), "ABCDE");
        assert_eq!(&cyclic(64)[60..], "89AB");
    }

    #[test]
    fn cyclic_length_and_prefix() {
        for n in 0..200 {
            let a = cyclic(n);
            let b = cyclic(n + 1);
            assert_eq!(a.len(), n);
            assert!(b.starts_with(&a));
        }
    }

    #[test]
    fn increasing_and_decreasing_mirror() {
        assert_eq!(increasing(28), "ABCDEFGHIJKLMNOPQRSTUVWXYZAB");
        let inc: String = increasing(40).chars().rev().collect();
        assert_eq!(decreasing(40), inc);
    }

    #[test]
    fn random_patterns_are_reproducible() {
        let a = random(64, &mut Rng::from_seed(7));
        let b = random(64, &mut Rng::from_seed(7));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| (33..127).contains(&c)));
    }

    #[test]
    fn alphanumeric_stays_in_alphabet() {
        let p = alphanumeric(256, &mut Rng::from_seed(1));
        assert!(p.bytes().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn unicode_has_requested_char_count() {
        let p = unicode(100, &mut Rng::from_seed(3));
        assert_eq!(p.chars().count(), 100);
        assert!(p.chars().all(|c| (c as u32) < BMP_LEN));
    }

    #[test]
    fn unknown_kind_is_cyclic() {
        let kind: PatternKind = "bogus".parse().unwrap();
        assert_eq!(kind, PatternKind::Cyclic);
        let mut rng = Rng::from_seed(0);
        assert_eq!(generate(kind, 10, &mut rng), cyclic(10));
    }

    #[test]
    fn fibonacci_small_bounds() {
        assert_eq!(fibonacci_indices(20), vec![1, 1, 2, 3, 5, 8, 13]);
        assert_eq!(fibonacci_indices(2), vec![1, 1]);
        assert!(fibonacci_indices(1).is_empty());
        assert!(fibonacci_indices(0).is_empty());
    }

    #[test]
    fn fibonacci_does_not_overflow() {
        let fib = fibonacci_indices(usize::MAX);
        assert!(fib.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn primes_below_fifty() {
        let primes = prime_indices(50);
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
        for p in primes {
            assert!((2..p).all(|d| p % d != 0), "{} is composite", p);
        }
        assert!(prime_indices(2).is_empty());
    }

    #[test]
    fn offset_little_endian_reverses_needle() {
        let haystack = cyclic(100);
        // "DCBA" written big-endian is "ABCD" in memory on little-endian
        assert_eq!(find_offset(haystack.as_bytes(), b"DCBA", Endianness::Little), Some(0));
        assert_eq!(find_offset(haystack.as_bytes(), b"KLMN", Endianness::Big), Some(10));
    }

    #[test]
    fn offset_of_register_value() {
        let haystack = cyclic(200);
        let word: [u8; 4] = haystack.as_bytes()[50..54].try_into().unwrap();
        let value = u32::from_le_bytes(word);
        assert_eq!(
            find_value_offset(haystack.as_bytes(), value, Endianness::Little),
            Some(50)
        );
    }

    #[test]
    fn offset_absent_is_none() {
        let haystack = cyclic(100);
        assert_eq!(find_value_offset(haystack.as_bytes(), 0xDEADBEEF, Endianness::Little), None);
        assert_eq!(find_offset(haystack.as_bytes(), b"", Endianness::Big), None);
        assert_eq!(find_offset(b"AB", b"ABC", Endianness::Big), None);
    }
}
