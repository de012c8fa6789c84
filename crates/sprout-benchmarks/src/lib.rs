//! Sprout benchmarking suite
//!
//! Benchmarks for graph construction, conflict detection, resolution and
//! ordering, plus catalog and version parsing.

pub mod common;

pub use common::*;
