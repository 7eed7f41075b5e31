//! Fuzz target modules
//!
//! Each module contains property-based tests for a specific instruction.
//! Run all tests with: cargo test --release -p sonic-router-fuzz

pub mod close_expired;
pub mod open_session;
pub mod send_message;
pub mod session_lifecycle;
