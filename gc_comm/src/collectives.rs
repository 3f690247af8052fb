//! Collective operations on a communicator.
//!
//! Contracts follow the usual message-passing conventions: every member
//! rank issues the same call, reductions fold the gathered values in rank
//! order so all ranks compute bit-identical results, and `exscan` leaves
//! the first (respectively last, for the reverse scan) rank without a
//! value rather than inventing an identity element.

use crate::comm::Comm;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl<'a> Comm<'a> {
    /// Blocks until every member rank has entered the barrier.
    pub fn barrier(&self) {
        self.allgather(&());
    }

    /// Gathers one value per rank, in rank order, on every rank.
    pub fn allgather<T>(&self, value: &T) -> Vec<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        for peer in 0..self.size() {
            if peer != self.rank() {
                self.send(peer, value);
            }
        }
        (0..self.size())
            .map(|peer| if peer == self.rank() { value.clone() } else { self.recv(peer) })
            .collect()
    }

    /// Gathers one value per rank on `root` only.
    pub fn gather<T>(&self, value: &T, root: usize) -> Option<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        if self.rank() == root {
            Some(
                (0..self.size())
                    .map(|peer| if peer == root { value.clone() } else { self.recv(peer) })
                    .collect(),
            )
        } else {
            self.send(root, value);
            None
        }
    }

    /// Concatenates the per-rank slices on `root`, in rank order.
    pub fn gatherv<T>(&self, values: &[T], root: usize) -> Option<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        if self.rank() == root {
            let mut gathered = Vec::new();
            for peer in 0..self.size() {
                if peer == root {
                    gathered.extend_from_slice(values);
                } else {
                    gathered.extend(self.recv::<Vec<T>>(peer));
                }
            }
            Some(gathered)
        } else {
            self.send(root, &values.to_vec());
            None
        }
    }

    /// Concatenates the per-rank slices on every rank, in rank order.
    pub fn allgatherv<T>(&self, values: &[T]) -> Vec<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let owned = values.to_vec();
        for peer in 0..self.size() {
            if peer != self.rank() {
                self.send(peer, &owned);
            }
        }
        let mut gathered = Vec::new();
        for peer in 0..self.size() {
            if peer == self.rank() {
                gathered.extend_from_slice(values);
            } else {
                gathered.extend(self.recv::<Vec<T>>(peer));
            }
        }
        gathered
    }

    /// Reduces one value per rank with `op`, result available on every
    /// rank. `op` must be associative; folding happens in rank order.
    pub fn allreduce<T, F>(&self, value: &T, op: F) -> T
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&T, &T) -> T,
    {
        let gathered = self.allgather(value);
        let mut iter = gathered.into_iter();
        let first = iter.next().expect("communicator has at least one member");
        iter.fold(first, |acc, next| op(&acc, &next))
    }

    /// Exclusive prefix reduction: rank `r` receives the reduction over
    /// ranks `[0, r)`, and rank 0 receives `None`.
    pub fn exscan<T, F>(&self, value: &T, op: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&T, &T) -> T,
    {
        let gathered = self.allgather(value);
        let mut iter = gathered.into_iter().take(self.rank());
        let first = iter.next()?;
        Some(iter.fold(first, |acc, next| op(&acc, &next)))
    }

    /// Reverse exclusive scan: rank `r` receives the reduction over ranks
    /// `(r, size)`, and the last rank receives `None`.
    pub fn exscan_rev<T, F>(&self, value: &T, op: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&T, &T) -> T,
    {
        let gathered = self.allgather(value);
        let mut iter = gathered.into_iter().skip(self.rank() + 1).rev();
        let first = iter.next()?;
        Some(iter.fold(first, |acc, next| op(&acc, &next)))
    }

    /// Broadcasts `root`'s value to every rank.
    pub fn broadcast<T>(&self, value: &T, root: usize) -> T
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        if self.rank() == root {
            for peer in 0..self.size() {
                if peer != root {
                    self.send(peer, value);
                }
            }
            value.clone()
        } else {
            self.recv(root)
        }
    }

    /// Personalized all-to-all: `buckets[i]` is delivered to member `i`.
    /// Returns the received buckets indexed by sending rank; the relative
    /// order of elements within each bucket is preserved. Empty buckets
    /// still participate, so every rank may call this unconditionally.
    pub fn all_to_all_v<T>(&self, mut buckets: Vec<Vec<T>>) -> Vec<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        assert_eq!(buckets.len(), self.size(), "one bucket per member rank required");
        let mut own = Some(std::mem::replace(&mut buckets[self.rank()], Vec::new()));
        for (peer, bucket) in buckets.iter().enumerate() {
            if peer != self.rank() {
                self.send(peer, bucket);
            }
        }
        (0..self.size())
            .map(|peer| {
                if peer == self.rank() {
                    own.take().expect("own bucket taken once")
                } else {
                    self.recv(peer)
                }
            })
            .collect()
    }

    /// Each rank sends its value to the previous rank; rank `r` receives
    /// the value of rank `r + 1`, the last rank receives `None`.
    pub fn left_shift<T>(&self, value: &T) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        if self.rank() > 0 {
            self.send(self.rank() - 1, value);
        }
        if self.is_last() {
            None
        } else {
            Some(self.recv(self.rank() + 1))
        }
    }

    /// Each rank sends its value to the next rank; rank `r` receives the
    /// value of rank `r - 1`, rank 0 receives `None`.
    pub fn right_shift<T>(&self, value: &T) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        if !self.is_last() {
            self.send(self.rank() + 1, value);
        }
        if self.rank() == 0 {
            None
        } else {
            Some(self.recv(self.rank() - 1))
        }
    }
}
