//! Parallel samplesort and sorted-sequence utilities.
//!
//! `sort_by` leaves the sequence globally sorted *and* block-balanced:
//! concatenating the ranks' local slices in rank order yields the sorted
//! global sequence. `is_sorted` is the cheap guard engines use to skip
//! the full sort when data already arrives ordered.

use crate::comm::Comm;
use crate::distribute::distribute_inplace;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;

/// Globally sorts a block-distributed vector with a samplesort: local
/// sort, regular sampling, splitter selection, personalized all-to-all,
/// local merge, rebalance.
pub fn sort_by<T, F>(data: &mut Vec<T>, comm: &Comm, cmp: F)
where
    T: Serialize + DeserializeOwned + Clone,
    F: Fn(&T, &T) -> Ordering + Copy,
{
    data.sort_by(cmp);
    if comm.size() == 1 {
        return;
    }

    // One sample per outgoing bucket boundary, evenly spaced over the
    // local sorted run.
    let sample_count = (comm.size() - 1).min(data.len());
    let samples: Vec<T> = (1..=sample_count)
        .map(|i| data[i * data.len() / (sample_count + 1)].clone())
        .collect();
    let mut all_samples = comm.allgatherv(&samples);
    all_samples.sort_by(cmp);
    if all_samples.is_empty() {
        // Globally empty; nothing to exchange.
        return;
    }
    let splitters: Vec<T> = (1..comm.size())
        .map(|i| all_samples[(i * all_samples.len() / comm.size()).min(all_samples.len() - 1)].clone())
        .collect();

    // Elements equal to a splitter go to the higher rank, matching the
    // splitter-bucketing tie rule.
    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); comm.size()];
    for element in data.drain(..) {
        let target = splitters
            .iter()
            .take_while(|splitter| cmp(splitter, &element) != Ordering::Greater)
            .count();
        buckets[target].push(element);
    }

    *data = comm
        .all_to_all_v(buckets)
        .into_iter()
        .kmerge_by(|a, b| cmp(a, b) != Ordering::Greater)
        .collect();

    distribute_inplace(data, comm);
}

/// Checks global sortedness, including across rank boundaries. Ranks with
/// empty slices participate transparently.
pub fn is_sorted<T, F>(data: &[T], comm: &Comm, cmp: F) -> bool
where
    T: Serialize + DeserializeOwned + Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let locally_sorted = data.windows(2).all(|pair| cmp(&pair[0], &pair[1]) != Ordering::Greater);
    let edges: Option<(T, T)> =
        data.first().map(|first| (first.clone(), data.last().expect("nonempty").clone()));
    let all_edges = comm.allgather(&edges);
    let boundaries_sorted = all_edges
        .iter()
        .flatten()
        .tuple_windows()
        .all(|((_, last), (next_first, _))| cmp(last, next_first) != Ordering::Greater);
    comm.allreduce(&(locally_sorted && boundaries_sorted), |a, b| *a && *b)
}

/// Counts distinct elements of a globally sorted distributed sequence.
///
/// Each rank skips its leading elements that continue the previous rank's
/// last bucket, counts local transitions, and the counts are summed.
pub fn unique_count<T, F>(data: &[T], comm: &Comm, eq: F) -> usize
where
    T: Serialize + DeserializeOwned + Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut local = 0;
    comm.with_subset(!data.is_empty(), |sub| {
        let previous_last = sub.right_shift(&data[data.len() - 1].clone());
        let mut begin = 0;
        if let Some(previous) = previous_last {
            while begin < data.len() && eq(&previous, &data[begin]) {
                begin += 1;
            }
        }
        if begin < data.len() {
            local = 1;
            for i in begin + 1..data.len() {
                if !eq(&data[i - 1], &data[i]) {
                    local += 1;
                }
            }
        }
    });
    comm.allreduce(&local, |a, b| a + b)
}

#[cfg(test)]
mod tests {
    use super::{is_sorted, sort_by, unique_count};
    use crate::comm::execute;
    use crate::distribute::BlockPartition;

    #[test]
    fn sorts_scattered_data() {
        for &ranks in &[1, 3, 4] {
            let results = execute(ranks, |comm| {
                // Interleaved descending runs so every rank contributes to
                // every part of the sorted order.
                let mut data: Vec<i64> =
                    (0..25).map(|i| ((i * ranks + comm.rank()) as i64 * 37) % 101).collect();
                sort_by(&mut data, comm, |a, b| a.cmp(b));
                assert!(is_sorted(&data, comm, |a, b| a.cmp(b)));
                data
            });
            let part = BlockPartition::new(25 * ranks, ranks);
            let mut merged = Vec::new();
            for (rank, local) in results.iter().enumerate() {
                assert_eq!(local.len(), part.local_size(rank));
                merged.extend_from_slice(local);
            }
            let mut expected: Vec<i64> =
                (0..25 * ranks).map(|i| (i as i64 * 37) % 101).collect();
            expected.sort();
            assert_eq!(merged, expected);
        }
    }

    #[test]
    fn detects_boundary_disorder() {
        let results = execute(2, |comm| {
            // Locally sorted but rank 0 ends above rank 1's start.
            let data: Vec<i64> = if comm.rank() == 0 { vec![5, 9] } else { vec![7, 8] };
            is_sorted(&data, comm, |a, b| a.cmp(b))
        });
        assert_eq!(results, vec![false, false]);
    }

    #[test]
    fn is_sorted_skips_empty_ranks() {
        let results = execute(3, |comm| {
            let data: Vec<i64> = if comm.rank() == 1 { Vec::new() } else { vec![comm.rank() as i64] };
            is_sorted(&data, comm, |a, b| a.cmp(b))
        });
        assert_eq!(results, vec![true, true, true]);
    }

    #[test]
    fn unique_count_merges_straddling_buckets() {
        let results = execute(3, |comm| {
            // Global sequence 1 1 1 | 1 2 2 | 2 3 3 with bucket straddles
            // at both rank boundaries.
            let data: Vec<i64> = match comm.rank() {
                0 => vec![1, 1, 1],
                1 => vec![1, 2, 2],
                _ => vec![2, 3, 3],
            };
            unique_count(&data, comm, |a, b| a == b)
        });
        assert_eq!(results, vec![3, 3, 3]);
    }

    #[test]
    fn unique_count_with_empty_ranks() {
        let results = execute(4, |comm| {
            let data: Vec<i64> = match comm.rank() {
                0 => vec![4, 4],
                2 => vec![4, 7],
                _ => Vec::new(),
            };
            unique_count(&data, comm, |a, b| a == b)
        });
        assert_eq!(results, vec![2, 2, 2, 2]);
    }
}
