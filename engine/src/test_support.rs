//! Test utilities for the engine crate.
//!
//! Shared by unit tests in `src/` and the behaviour suites in `tests/`. Only
//! compiled for tests or with the `test-support` feature.

pub mod harness;

pub use crate::clock::MutableClock;
pub use harness::{EngineHarness, at, definition};
