//! Splitter-defined bucketing of arbitrary keys to owning ranks.
//!
//! Given a block-distributed, globally sorted sequence, every rank's
//! smallest key is gathered and the list minus rank 0's entry forms the
//! `P - 1` splitters. A foreign key is owned by the rank found with a
//! lower bound over the splitters; a key equal to a splitter belongs to
//! the higher rank. With `P = 1` there are no splitters and rank 0 owns
//! everything.

use crate::comm::Comm;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;

/// Builds the splitter list from each rank's smallest local key.
///
/// Collective. The caller guarantees the underlying sequence is globally
/// sorted and every member rank holds at least one element (use
/// `with_subset` to narrow the communicator first when needed).
pub fn splitters_from_sorted<T>(first_local_key: &T, comm: &Comm) -> Vec<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let mut all = comm.allgather(first_local_key);
    // Rank 0's first key bounds nothing below it.
    all.remove(0);
    all
}

/// Owner rank of `key` under the splitter tie rule.
pub fn owner_of<T, F>(splitters: &[T], key: &T, cmp: F) -> usize
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut owner = 0;
    for splitter in splitters {
        match cmp(splitter, key) {
            // A key equal to a splitter belongs to the higher rank.
            Ordering::Less | Ordering::Equal => owner += 1,
            Ordering::Greater => break,
        }
    }
    owner
}

/// Routes every element to the rank computed by `owner`, preserving the
/// per-sender relative order of the received elements. Ranks with nothing
/// to send still participate with empty buckets.
pub fn route<T, F>(elements: Vec<T>, comm: &Comm, owner: F) -> Vec<T>
where
    T: Serialize + DeserializeOwned + Clone,
    F: Fn(&T) -> usize,
{
    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); comm.size()];
    for element in elements {
        let target = owner(&element);
        assert!(target < comm.size(), "bucketed key routed to nonexistent rank {}", target);
        buckets[target].push(element);
    }
    comm.all_to_all_v(buckets).into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::{owner_of, route, splitters_from_sorted};
    use crate::comm::execute;

    #[test]
    fn owner_lower_bound_with_high_tie() {
        let splitters = vec![10_i64, 20, 30];
        assert_eq!(owner_of(&splitters, &3, |a, b| a.cmp(b)), 0);
        assert_eq!(owner_of(&splitters, &10, |a, b| a.cmp(b)), 1);
        assert_eq!(owner_of(&splitters, &19, |a, b| a.cmp(b)), 1);
        assert_eq!(owner_of(&splitters, &30, |a, b| a.cmp(b)), 3);
        assert_eq!(owner_of(&splitters, &99, |a, b| a.cmp(b)), 3);
    }

    #[test]
    fn no_splitters_means_rank_zero() {
        assert_eq!(owner_of::<i64, _>(&[], &42, |a, b| a.cmp(b)), 0);
    }

    #[test]
    fn routing_respects_splitter_ranges() {
        let results = execute(3, |comm| {
            // Sorted global sequence: 0..10 | 10..20 | 20..30.
            let first = (comm.rank() * 10) as i64;
            let splitters = splitters_from_sorted(&first, comm);
            assert_eq!(splitters, vec![10, 20]);

            // Every rank scatters the same probe keys.
            let keys: Vec<i64> = vec![0, 9, 10, 25];
            let routed =
                route(keys, comm, |key| owner_of(&splitters, key, |a, b| a.cmp(b)));
            routed
        });
        assert_eq!(results[0], vec![0, 9, 0, 9, 0, 9]);
        assert_eq!(results[1], vec![10, 10, 10]);
        assert_eq!(results[2], vec![25, 25, 25]);
    }
}
