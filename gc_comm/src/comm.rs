use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// A payload travelling between two ranks: the sender's world rank plus
/// the bincode-encoded value.
type Packet = (usize, Vec<u8>);

/// How long a rank waits on a peer before declaring the job dead. A peer
/// that panicked can never deliver, and a missing message otherwise means
/// the collective call sequence diverged between ranks.
const PEER_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-thread endpoint of the channel mesh. Owns the rank's inbox and a
/// sender handle to every rank in the world, including itself.
pub struct Endpoint {
    world_rank: usize,
    senders: Vec<Sender<Packet>>,
    inbox: Receiver<Packet>,
    /// Messages that arrived ahead of the collective currently being
    /// matched, parked per sending rank. Pairwise FIFO delivery plus the
    /// global collective ordering make this demultiplexing exact.
    parked: RefCell<Vec<VecDeque<Vec<u8>>>>,
}

/// A communicator over an ordered set of member ranks.
///
/// The world communicator covers all ranks; `with_subset` derives scoped
/// sub-communicators over the ranks that still have work. Ranks are always
/// addressed by their index *within* the communicator.
pub struct Comm<'a> {
    endpoint: &'a Endpoint,
    /// World ranks of the members, ascending.
    members: Vec<usize>,
    /// This rank's index within `members`.
    rank: usize,
}

/// Runs `f` once per rank on `ranks` threads wired into a full channel
/// mesh, and returns the per-rank results in rank order.
///
/// This is the process-launcher analog: each closure invocation plays the
/// role of one process of a bulk-synchronous job.
pub fn execute<T, F>(ranks: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Comm) -> T + Sync,
{
    assert!(ranks > 0, "communicator needs at least one rank");
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..ranks).map(|_| unbounded()).unzip();
    let f = &f;
    crossbeam_utils::thread::scope(|scope| {
        let handles = receivers
            .into_iter()
            .enumerate()
            .map(|(world_rank, inbox)| {
                let senders = senders.clone();
                scope.spawn(move |_| {
                    let endpoint = Endpoint {
                        world_rank,
                        senders,
                        inbox,
                        parked: RefCell::new(vec![VecDeque::new(); ranks]),
                    };
                    f(&Comm::world(&endpoint, ranks))
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("rank thread panicked"))
            .collect()
    })
    .expect("rank scope failed")
}

impl<'a> Comm<'a> {
    fn world(endpoint: &'a Endpoint, ranks: usize) -> Self {
        Comm { rank: endpoint.world_rank, endpoint, members: (0..ranks).collect() }
    }

    /// This rank's index within the communicator.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of member ranks.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_last(&self) -> bool {
        self.rank + 1 == self.size()
    }

    /// Sends `value` to the member with index `to`. Never blocks.
    pub fn send<T: Serialize>(&self, to: usize, value: &T) {
        let world_to = self.members[to];
        let bytes = bincode::serialize(value).expect("collective payload failed to encode");
        self.endpoint.senders[world_to]
            .send((self.endpoint.world_rank, bytes))
            .expect("peer rank hung up");
    }

    /// Receives the next value sent by the member with index `from`.
    pub fn recv<T: DeserializeOwned>(&self, from: usize) -> T {
        let world_from = self.members[from];
        let bytes = self.recv_bytes(world_from);
        bincode::deserialize(&bytes)
            .expect("collective payload failed to decode: call sequence diverged between ranks")
    }

    fn recv_bytes(&self, world_from: usize) -> Vec<u8> {
        if let Some(bytes) = self.endpoint.parked.borrow_mut()[world_from].pop_front() {
            return bytes;
        }
        loop {
            let (sender, bytes) = self
                .endpoint
                .inbox
                .recv_timeout(PEER_TIMEOUT)
                .unwrap_or_else(|_| {
                    panic!(
                        "rank {} timed out waiting for rank {}: peer aborted or the \
                         collective call sequence diverged",
                        self.endpoint.world_rank, world_from
                    )
                });
            if sender == world_from {
                return bytes;
            }
            self.endpoint.parked.borrow_mut()[sender].push_back(bytes);
        }
    }

    /// Runs `f` on a scoped sub-communicator containing exactly the member
    /// ranks that passed `include = true`. Collective on the parent: every
    /// member must call it, with its own flag. Ranks outside the subset
    /// skip `f` entirely and are never blocked by the subset's release.
    pub fn with_subset<F: FnOnce(&Comm)>(&self, include: bool, f: F) {
        let flags = self.allgather(&include);
        if !include {
            return;
        }
        let members: Vec<usize> = self
            .members
            .iter()
            .zip(flags.iter())
            .filter(|(_, &flag)| flag)
            .map(|(&world, _)| world)
            .collect();
        let rank = members
            .iter()
            .position(|&world| world == self.endpoint.world_rank)
            .expect("subset must contain the calling rank");
        let sub = Comm { endpoint: self.endpoint, members, rank };
        f(&sub);
    }
}
