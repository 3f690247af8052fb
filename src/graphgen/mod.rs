//! Producers of block-distributed edge lists.
//!
//! Every generator emits each undirected edge in both directions, which
//! the engines rely on (see `graph::check_edge_bidirectionality`).

pub mod chain;
pub mod debruijn;
pub mod file_input;
pub mod kronecker;
