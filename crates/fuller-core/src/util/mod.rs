//! Utility functions and types used throughout Fuller.
//!
//! This module provides various helper types and traits including:
//! - [`Size`] - Object size representation
//! - Constants for layout and chain heuristics ([`LINEAR_FILL`], [`BAD_CHARS`], etc.)
//! - [`GroupBy`] trait for collection grouping operations
//! - Address packing ([`pack_address`], [`unpack_address`])
//! - Progress reporting utilities ([`NamedProgress`])
//! - Random number generation ([`Rng`])

mod constants;
mod named_progress;
mod pack;
mod rng;
mod size;

pub use self::constants::*;
pub use self::named_progress::NamedProgress;
pub use self::pack::{Endianness, pack_address, unpack_address};
pub use self::rng::Rng;
pub use self::size::Size;

use std::collections::HashMap;

/// Trait for grouping collection elements by a key function.
///
/// This trait extends collections with the ability to group elements based on
/// a key extraction function, similar to SQL's GROUP BY operation.
pub trait GroupBy<V> {
    /// Groups elements by the result of applying a function to each element.
    ///
    /// Elements keep their relative order inside each group.
    fn group_by<K: std::hash::Hash + std::cmp::Eq, F: Fn(&V) -> K>(
        self,
        f: F,
    ) -> HashMap<K, Vec<V>>;
}

impl<T> GroupBy<T> for Vec<T> {
    fn group_by<K: std::hash::Hash + std::cmp::Eq, F: Fn(&T) -> K>(
        self,
        f: F,
    ) -> HashMap<K, Vec<T>> {
        let mut out = HashMap::new();
        for elem in self {
            let k = f(&elem);
            out.entry(k).or_insert(vec![]).push(elem);
        }
        out
    }
}

/// Creates a vector by applying a function to each index.
///
/// # Arguments
///
/// * `n` - Number of elements to create
/// * `f` - Function that takes an index and returns a value
///
/// # Examples
///
/// ```
/// use fuller_core::util::make_vec;
///
/// let squares = make_vec(5, |i| i * i);
/// assert_eq!(squares, vec![0, 1, 4, 9, 16]);
/// ```
pub fn make_vec<T>(n: usize, f: impl Fn(usize) -> T) -> Vec<T> {
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let val = f(i);
        v.push(val);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::GroupBy;

    #[test]
    fn test_group_mod2() {
        let addrs = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let groups = addrs.group_by(|x| x % 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&0], vec![0, 2, 4, 6, 8]);
        assert_eq!(groups[&1], vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_group_prefix() {
        let names = vec!["pop_rdi", "call_rax", "pop_rsi", "call_rbx"];
        let groups = names.group_by(|x| &x[0..3]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["pop"], vec!["pop_rdi", "pop_rsi"]);
        assert_eq!(groups["cal"], vec!["call_rax", "call_rbx"]);
    }
}
