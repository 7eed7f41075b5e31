//! Property-based fuzz testing library for the Sonic Router
//!
//! Drives the router's session, fee vault and outbox state transitions with
//! generated inputs and checks the ledger invariants after every instruction.
//!
//! # Usage
//!
//! ```bash
//! # Run all property-based tests
//! cargo test --release -p sonic-router-fuzz
//!
//! # Run the fuzz test runner
//! cargo run --release -p sonic-router-fuzz
//!
//! # Run with more iterations
//! PROPTEST_CASES=10000 cargo test --release -p sonic-router-fuzz
//! ```

pub mod arbitrary;
pub mod invariants;
pub mod scenarios;

pub use arbitrary::*;
pub use invariants::*;
pub use scenarios::*;

// Include fuzz targets as test modules
#[cfg(test)]
#[path = "../fuzz_targets/open_session.rs"]
mod open_session_tests;

#[cfg(test)]
#[path = "../fuzz_targets/send_message.rs"]
mod send_message_tests;

#[cfg(test)]
#[path = "../fuzz_targets/close_expired.rs"]
mod close_expired_tests;

#[cfg(test)]
#[path = "../fuzz_targets/session_lifecycle.rs"]
mod session_lifecycle_tests;
