//! Events emitted by the Sonic Router
//!
//! Relayers subscribe to `EntryCommitted` to pick up new outbox entries
//! without polling the outbox account.

use crate::message::GridMessage;
use anchor_lang::prelude::*;

/// Emitted when a session is opened
#[event]
pub struct SessionOpened {
    pub session: Pubkey,
    pub owner: Pubkey,
    pub grid_id: u64,
    pub allowed_programs: u8,
    pub allowed_opcodes: u8,
    pub ttl_slots: u64,
    pub fee_cap: u64,
    pub expires_at: u64,
    pub slot: u64,
}

/// Emitted when lamports are deposited into a fee vault
#[event]
pub struct FeeDeposited {
    pub fee_vault: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub balance: u64,
    pub vault_created: bool,
    pub slot: u64,
}

/// Emitted the first time an owner's outbox is created
#[event]
pub struct OutboxCreated {
    pub outbox: Pubkey,
    pub authority: Pubkey,
    pub slot: u64,
}

/// Emitted for every message appended to an outbox
#[event]
pub struct EntryCommitted {
    pub entry: Pubkey,
    pub entry_id: [u8; 32],
    pub outbox: Pubkey,
    pub session: Pubkey,
    pub grid_id: u64,
    pub entry_index: u64,
    pub nonce: u64,
    pub fee_budget: u64,
    /// Outbox chain hash after this entry
    pub chain_hash: [u8; 32],
    pub message: GridMessage,
    pub slot: u64,
}

/// Emitted when an expired session is closed
#[event]
pub struct SessionClosed {
    pub session: Pubkey,
    pub owner: Pubkey,
    pub grid_id: u64,
    pub messages_sent: u64,
    pub fee_spent: u64,
    pub reclaimed_lamports: u64,
    pub slot: u64,
}
