#![forbid(unsafe_code)]
//! Reader-side tooling for the Sonic Router.
//!
//! Derives router account addresses, decodes account snapshots from any
//! [`AccountReader`] source (including HSSN explorer records), and verifies
//! the ledger invariants the program maintains.

use std::ops::Range;

use anchor_lang::prelude::Pubkey;
use sonic_router::utils::pda::{
    fee_vault_address, outbox_address, outbox_entry_address, session_address,
};

pub mod config;
pub mod decode;
pub mod error;
pub mod hssn;
pub mod render;
pub mod snapshot;
pub mod verify;

#[cfg(test)]
mod testing;

pub use decode::{
    decode_entry, decode_fee_vault, decode_outbox, decode_session, load_entry, load_fee_vault,
    load_outbox, load_session, Loaded,
};
pub use error::ReaderError;
pub use snapshot::{AccountReader, AccountSnapshot, MemoryReader};
pub use verify::{verify_fee_vault, verify_outbox, verify_session, OutboxReport, Violation};

/// Addresses of every per-owner router account for one grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterAddresses {
    pub owner: Pubkey,
    pub grid_id: u64,
    pub session: Pubkey,
    pub fee_vault: Pubkey,
    pub outbox: Pubkey,
}

pub fn derive_addresses(owner: &Pubkey, grid_id: u64) -> RouterAddresses {
    RouterAddresses {
        owner: *owner,
        grid_id,
        session: session_address(owner, grid_id).0,
        fee_vault: fee_vault_address(owner).0,
        outbox: outbox_address(owner).0,
    }
}

/// Entry addresses for `indices` of `outbox`
pub fn entry_addresses(outbox: &Pubkey, indices: Range<u64>) -> Vec<Pubkey> {
    indices
        .map(|index| outbox_entry_address(outbox, index).0)
        .collect()
}
