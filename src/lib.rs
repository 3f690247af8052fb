//! Graphconnect computes the weakly connected components of very large
//! undirected graphs on a distributed set of ranks using bulk-synchronous
//! message passing. The edge list is block-distributed; a strategy
//! selector inspects the degree distribution and either peels the giant
//! component with a distributed SpMV BFS before label-propagation
//! coloring, or runs coloring alone. The output is the number of
//! components, with the vertex partition implicit in the final labels.

// Enable warnings for all clippy lints. This automatically enables new lints shipped with new rust
// versions.
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::cargo,
    clippy::restriction
)]
// Now selectively disable unneeded lints.
#![allow(
    clippy::indexing_slicing,               // Allow `vec[i]` indexing.
    clippy::module_name_repetitions,        // Allow.
    clippy::use_debug,                      // Allow.
    clippy::float_arithmetic,               // Allow.
    clippy::integer_arithmetic,             // Allow.
    clippy::integer_division,               // Allow.
    clippy::implicit_return,                // Allow.
    clippy::too_many_arguments,             // Allow.
    clippy::use_self,                       // Allow.
    clippy::shadow_same,                    // Allow.
    clippy::too_many_lines,                 // Allow.
    clippy::multiple_crate_versions,        // Disabled.
    clippy::missing_docs_in_private_items,  // Disabled.
    clippy::missing_errors_doc,             // Disabled.
    clippy::missing_panics_doc,             // Disabled.
    clippy::missing_inline_in_public_items, // Disabled.
    clippy::cognitive_complexity,           // Disabled.
    clippy::expect_used,                    // Should use `expect` rather than `unwrap`.
    clippy::panic,                          // Allow.
    clippy::unreachable,                    // Allow.
    clippy::must_use_candidate,             // Allow.
    clippy::inline_always,                  // Allow.
    clippy::as_conversions,                 // Allow but only when absolutely necessary.
    clippy::implicit_hasher,                // Default hasher is fine for now.
    clippy::blanket_clippy_restriction_lints,
    clippy::pattern_type_mismatch,
    clippy::unwrap_in_result,
    clippy::map_err_ignore,
    clippy::exhaustive_structs,
    clippy::exhaustive_enums,
    clippy::default_numeric_fallback,
    clippy::wildcard_enum_match_arm
)]
// Do not allow print statements. Use `log::info!()` or equivalent instead.
#![deny(clippy::print_stdout)]

pub mod bfs;
pub mod coloring;
pub mod driver;
pub mod error;
pub mod graph;
pub mod graphgen;
pub mod selector;
pub mod sequential;
pub mod util;

#[macro_use]
extern crate derive_new;
