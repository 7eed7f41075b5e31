//! Out-of-band checks of router account invariants.
//!
//! These recompute what the program maintains incrementally (ledger totals,
//! entry ids, the outbox chain) from the accounts as read back.

use anchor_lang::prelude::{Pubkey, Rent};
use sonic_router::state::{next_chain_hash, FeeVault, OutboxEntry, Session, HASH_SIZE};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::decode::{load_entry, load_outbox, Loaded};
use crate::error::ReaderError;
use crate::snapshot::AccountReader;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{kind} owner {found} does not match {expected}")]
    OwnerMismatch {
        kind: &'static str,
        expected: Pubkey,
        found: Pubkey,
    },

    #[error("fee vault balance {balance} != deposited {deposited} - debited {debited}")]
    VaultLedgerMismatch {
        balance: u64,
        deposited: u64,
        debited: u64,
    },

    #[error("fee vault holds {lamports} lamports, needs at least {required}")]
    VaultUnderfunded { lamports: u64, required: u64 },

    #[error("session fee_spent {spent} exceeds fee_cap {cap}")]
    FeeCapExceeded { spent: u64, cap: u64 },

    #[error("session expires_at {expires_at} != created_at {created_at} + ttl_slots {ttl_slots}")]
    ExpiryMismatch {
        expires_at: u64,
        created_at: u64,
        ttl_slots: u64,
    },

    #[error("session allowlist holds {len} items, max {max}")]
    AllowlistTooLong { len: usize, max: usize },

    #[error("outbox entry at position {position} records index {index}")]
    EntryOutOfPlace { position: u64, index: u64 },

    #[error("outbox entry {index} belongs to outbox {found}")]
    EntryOutboxMismatch { index: u64, found: Pubkey },

    #[error("outbox entry {index} id does not match its contents")]
    EntryIdMismatch { index: u64 },

    #[error("outbox entry {index} holds {lamports} lamports, needs rent plus fee {required}")]
    EntryUnderfunded {
        index: u64,
        lamports: u64,
        required: u64,
    },

    #[error("outbox chain hash does not match its entries")]
    ChainHashMismatch,
}

/// Summary of a verified outbox
#[derive(Debug, Clone)]
pub struct OutboxReport {
    pub address: Pubkey,
    pub entry_count: u64,
    pub chain_hash: [u8; HASH_SIZE],
    pub last_committed_slot: u64,
    /// Sum of fees escrowed in entries
    pub total_escrowed: u64,
    pub entries: Vec<Loaded<OutboxEntry>>,
}

/// Check the vault ledger and, when lamports are known, its backing.
pub fn verify_fee_vault(
    vault: &Loaded<FeeVault>,
    owner: &Pubkey,
    rent_exempt_minimum: u64,
) -> Result<(), Violation> {
    let account = &vault.account;
    if account.owner != *owner {
        return Err(Violation::OwnerMismatch {
            kind: "fee vault",
            expected: *owner,
            found: account.owner,
        });
    }

    let consistent = account
        .total_deposited
        .checked_sub(account.total_debited)
        .is_some_and(|net| net == account.balance);
    if !consistent {
        return Err(Violation::VaultLedgerMismatch {
            balance: account.balance,
            deposited: account.total_deposited,
            debited: account.total_debited,
        });
    }

    if let Some(lamports) = vault.lamports {
        let required = rent_exempt_minimum.saturating_add(account.balance);
        if lamports < required {
            return Err(Violation::VaultUnderfunded { lamports, required });
        }
    }
    Ok(())
}

/// Check a session's stored fields against each other.
pub fn verify_session(session: &Loaded<Session>, owner: &Pubkey) -> Result<(), Violation> {
    let account = &session.account;
    if account.owner != *owner {
        return Err(Violation::OwnerMismatch {
            kind: "session",
            expected: *owner,
            found: account.owner,
        });
    }
    if account.fee_spent > account.fee_cap {
        return Err(Violation::FeeCapExceeded {
            spent: account.fee_spent,
            cap: account.fee_cap,
        });
    }
    if account.created_at.checked_add(account.ttl_slots) != Some(account.expires_at) {
        return Err(Violation::ExpiryMismatch {
            expires_at: account.expires_at,
            created_at: account.created_at,
            ttl_slots: account.ttl_slots,
        });
    }
    for (len, max) in [
        (account.allowed_programs.len(), Session::MAX_ALLOWED_PROGRAMS),
        (account.allowed_opcodes.len(), Session::MAX_ALLOWED_OPCODES),
    ] {
        if len > max {
            return Err(Violation::AllowlistTooLong { len, max });
        }
    }
    Ok(())
}

/// Read every entry of `owner`'s outbox and check the log end to end:
/// entries 0..entry_count exist in place, each id matches its contents,
/// and folding the ids reproduces the stored chain hash. Entries with known
/// lamports must still hold their rent-exempt minimum plus the escrowed fee.
#[instrument(skip(reader, owner, rent), fields(owner = %owner))]
pub fn verify_outbox<R>(
    reader: &R,
    owner: &Pubkey,
    rent: &Rent,
) -> Result<OutboxReport, ReaderError>
where
    R: AccountReader + ?Sized,
{
    let outbox = load_outbox(reader, owner)?;
    if outbox.account.entry_count > 0 && outbox.account.authority != *owner {
        return Err(Violation::OwnerMismatch {
            kind: "outbox",
            expected: *owner,
            found: outbox.account.authority,
        }
        .into());
    }

    let mut chain = [0u8; HASH_SIZE];
    let mut total_escrowed = 0u64;
    let mut entries = Vec::new();

    for position in 0..outbox.account.entry_count {
        let entry = load_entry(reader, &outbox.address, position)?;
        let account = &entry.account;

        if account.index != position {
            return Err(Violation::EntryOutOfPlace {
                position,
                index: account.index,
            }
            .into());
        }
        if account.outbox != outbox.address {
            return Err(Violation::EntryOutboxMismatch {
                index: position,
                found: account.outbox,
            }
            .into());
        }
        if account.authority != *owner {
            return Err(Violation::OwnerMismatch {
                kind: "outbox entry",
                expected: *owner,
                found: account.authority,
            }
            .into());
        }
        let expected_id = account.expected_id().map_err(|err| ReaderError::Decode {
            address: entry.address,
            kind: "outbox entry",
            reason: err.to_string(),
        })?;
        if expected_id != account.entry_id {
            return Err(Violation::EntryIdMismatch { index: position }.into());
        }
        if let Some(lamports) = entry.lamports {
            let required = rent
                .minimum_balance(OutboxEntry::space_for(&account.message))
                .saturating_add(account.fee_budget);
            if lamports < required {
                return Err(Violation::EntryUnderfunded {
                    index: position,
                    lamports,
                    required,
                }
                .into());
            }
        }

        chain = next_chain_hash(&chain, &account.entry_id);
        total_escrowed = total_escrowed.saturating_add(account.fee_budget);
        entries.push(entry);
    }

    if chain != outbox.account.chain_hash {
        return Err(Violation::ChainHashMismatch.into());
    }

    debug!(
        entry_count = outbox.account.entry_count,
        total_escrowed, "outbox verified"
    );

    Ok(OutboxReport {
        address: outbox.address,
        entry_count: outbox.account.entry_count,
        chain_hash: outbox.account.chain_hash,
        last_committed_slot: outbox.account.last_committed_slot,
        total_escrowed,
        entries,
    })
}
