//! Compute unit profiling and budget utilities.
//!
//! Provides helpers for tracking compute unit consumption within instructions
//! and recommended CU budgets for each instruction.
//!
//! # Usage
//!
//! For SDK/client-side: use the `RECOMMENDED_CU_*` constants (or
//! [`recommended_send_message_cu`]) when building transactions with
//! `ComputeBudgetInstruction::set_compute_unit_limit()`.
//!
//! For on-chain profiling: call `log_compute_units("label")` at key points
//! within instruction handlers to measure CU consumption during development.

use anchor_lang::prelude::*;

// ============================================================================
// Recommended Compute Unit Budgets per Instruction
// ============================================================================
//
// Conservative upper bounds, rounded up to the nearest 10k.

/// Open session: PDA derivation + account init + allowlist validation (~20k measured)
pub const RECOMMENDED_CU_OPEN_SESSION: u32 = 30_000;

/// Deposit fee: vault init on first use + CPI transfer + reconcile (~15k measured)
pub const RECOMMENDED_CU_DEPOSIT_FEE: u32 = 30_000;

/// Send message: two PDA inits + entry hashing + chain update (~45k measured
/// for an empty invoke payload)
pub const RECOMMENDED_CU_SEND_MESSAGE: u32 = 60_000;

/// Close expired session: state read + account close (~8k measured)
pub const RECOMMENDED_CU_CLOSE_EXPIRED: u32 = 20_000;

/// Extra budget per KiB of encoded message (copy, hash and store)
pub const SEND_MESSAGE_CU_PER_KIB: u32 = 10_000;

/// Maximum compute units a single transaction may request
pub const MAX_CU_PER_TRANSACTION: u32 = 1_400_000;

/// Recommended CU limit for a `send_message` carrying a message of
/// `encoded_len` bytes.
pub fn recommended_send_message_cu(encoded_len: usize) -> u32 {
    let kib = u32::try_from(encoded_len.div_ceil(1024)).unwrap_or(u32::MAX);
    RECOMMENDED_CU_SEND_MESSAGE
        .saturating_add(kib.saturating_mul(SEND_MESSAGE_CU_PER_KIB))
        .min(MAX_CU_PER_TRANSACTION)
}

/// Log current compute units consumed (development/profiling only).
///
/// Calls `sol_log_compute_units()` with a descriptive label.
///
/// # Usage
/// ```ignore
/// log_compute_units("send_message_start");
/// // ... commit ...
/// log_compute_units("send_message_end");
/// ```
pub fn log_compute_units(label: &str) {
    msg!("CU checkpoint [{}]", label);
    #[cfg(target_os = "solana")]
    anchor_lang::solana_program::log::sol_log_compute_units();
}
