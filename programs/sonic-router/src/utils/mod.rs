//! Shared utilities

pub mod compute_budget;
pub mod pda;
