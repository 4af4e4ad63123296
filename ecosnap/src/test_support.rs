//! Test utilities for the ecosnap crate.
//!
//! Shared doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and behind the `test-support` feature.

pub mod camera;
pub mod clock;
pub mod location;
pub mod storage;
