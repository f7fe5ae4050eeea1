//! Progress and gamification engine for a practice-tracking product.
//!
//! The crate turns completed practice sessions into durable statistics,
//! streaks, levels, achievement unlocks, and challenge progress. Domain types
//! and services live in [`domain`]; adapters for driven ports live in
//! [`outbound`].

pub mod clock;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
