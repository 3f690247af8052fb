//! Bulk-synchronous message passing for the graphconnect engines.
//!
//! A `Comm` connects `P` rank threads with pairwise FIFO channels and
//! exposes the collective calls the engines are written against: barrier,
//! gathers, reductions, exclusive scans, personalized all-to-all and
//! neighbour shifts. On top of those sit the distributed primitives shared
//! by the engines: block (re)distribution, parallel samplesort, global
//! unique counting and splitter-defined bucketing.
//!
//! Every collective is globally ordered: all member ranks of a
//! communicator must issue the same sequence of collective calls. Subsets
//! of ranks communicate through scoped sub-communicators obtained with
//! [`Comm::with_subset`]; the sub-communicator cannot escape its block and
//! releasing it involves no communication.

pub mod bucket;
mod collectives;
pub mod comm;
pub mod distribute;
pub mod sort;

pub use crate::comm::{execute, Comm};
