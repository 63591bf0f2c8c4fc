//! Deterministic, pure logic shared by the form orchestration.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod actions;
pub mod descriptors;
pub mod fields;
pub mod invariants;
pub mod merge;
pub mod sequence;
pub mod types;
