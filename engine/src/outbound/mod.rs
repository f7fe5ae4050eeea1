//! Outbound adapters implementing domain ports.
//!
//! - **memory**: process-local repositories with optimistic versioning, used
//!   by the replay binary and the behaviour suites.
//! - **catalog**: achievement definitions loaded from JSON.
//!
//! Adapters translate between domain types and storage. They contain no
//! business logic.

pub mod catalog;
pub mod memory;
