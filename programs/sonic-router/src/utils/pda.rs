//! Address derivation for router accounts.
//!
//! Off-chain clients use these to locate accounts before building
//! transactions; the seeds match the account constraints in `instructions`.

use crate::state::{FEE_VAULT_SEED, OUTBOX_ENTRY_SEED, OUTBOX_SEED, SESSION_SEED};
use anchor_lang::prelude::*;

/// Session PDA for `(owner, grid_id)`
pub fn session_address(owner: &Pubkey, grid_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SESSION_SEED, owner.as_ref(), &grid_id.to_le_bytes()],
        &crate::ID,
    )
}

/// Fee vault PDA for `owner`
pub fn fee_vault_address(owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[FEE_VAULT_SEED, owner.as_ref()], &crate::ID)
}

/// Outbox PDA for `owner`
pub fn outbox_address(owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[OUTBOX_SEED, owner.as_ref()], &crate::ID)
}

/// Entry PDA at `index` in `outbox`
pub fn outbox_entry_address(outbox: &Pubkey, index: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[OUTBOX_ENTRY_SEED, outbox.as_ref(), &index.to_le_bytes()],
        &crate::ID,
    )
}
