//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, randomness oracle, storage) are
//! abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod oracle;
pub mod store;

pub use clock::NullClock;
pub use oracle::{NullOracle, OracleBehavior};
pub use store::NullStore;
