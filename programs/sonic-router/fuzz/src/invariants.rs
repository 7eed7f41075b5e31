//! Router invariant checking for fuzz testing
//!
//! Each check inspects real router state and reports the first way it
//! disagrees with the ledger rules.

use sonic_router::state::{next_chain_hash, FeeVault, Outbox, OutboxEntry, Session, HASH_SIZE};

/// Fee vault invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultInvariantResult {
    Valid,
    /// V1: balance must equal deposits minus debits
    LedgerMismatch {
        balance: u64,
        deposited: u64,
        debited: u64,
    },
    /// V2: lamports must cover rent plus the tracked balance
    LamportShortfall { lamports: u64, required: u64 },
    /// V3: every debited lamport is escrowed in exactly one entry
    DebitsNotEscrowed { debited: u64, escrowed: u64 },
}

/// Session invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInvariantResult {
    Valid,
    /// S1: cumulative fees never exceed the cap
    FeeCapExceeded { spent: u64, cap: u64 },
    /// S2: nonce equals the number of messages sent under the session
    NonceMismatch { nonce: u64, sent: u64 },
    /// S3: fee_spent equals the sum of fee budgets sent under the session
    FeeSpentMismatch { spent: u64, sent: u64 },
    /// S4: expires_at == created_at + ttl_slots
    ExpiryMismatch { expires_at: u64, created_at: u64, ttl_slots: u64 },
    /// S5: nonce is monotonic
    NonceRegressed { before: u64, after: u64 },
}

/// Outbox invariant results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxInvariantResult {
    Valid,
    /// O1: entry_count equals the number of stored entries
    CountMismatch { entry_count: u64, stored: u64 },
    /// O2: entries are stored at consecutive indices from zero
    IndexGap { position: u64, index: u64 },
    /// O3: entry ids are derived from entry contents
    EntryIdMismatch { index: u64 },
    /// O4: chain hash folds every entry id in order
    ChainMismatch,
}

// ============================================================================
// Fee Vault Invariants
// ============================================================================

/// V1: Ledger consistency
pub fn check_vault_ledger(vault: &FeeVault) -> VaultInvariantResult {
    let consistent = vault
        .total_deposited
        .checked_sub(vault.total_debited)
        .map(|net| net == vault.balance)
        .unwrap_or(false);
    if consistent {
        VaultInvariantResult::Valid
    } else {
        VaultInvariantResult::LedgerMismatch {
            balance: vault.balance,
            deposited: vault.total_deposited,
            debited: vault.total_debited,
        }
    }
}

/// V2: Lamport backing
pub fn check_vault_backing(
    vault: &FeeVault,
    lamports: u64,
    rent_exempt_minimum: u64,
) -> VaultInvariantResult {
    let required = rent_exempt_minimum.saturating_add(vault.balance);
    if lamports < required {
        VaultInvariantResult::LamportShortfall { lamports, required }
    } else {
        VaultInvariantResult::Valid
    }
}

/// V3: Fee conservation between the vault and outbox entries
pub fn check_fee_conservation(vault: &FeeVault, entries: &[OutboxEntry]) -> VaultInvariantResult {
    let escrowed = entries
        .iter()
        .fold(0u64, |sum, entry| sum.saturating_add(entry.fee_budget));
    if escrowed != vault.total_debited {
        VaultInvariantResult::DebitsNotEscrowed {
            debited: vault.total_debited,
            escrowed,
        }
    } else {
        VaultInvariantResult::Valid
    }
}

// ============================================================================
// Session Invariants
// ============================================================================

/// S1: Cumulative fee cap
pub fn check_fee_cap(session: &Session) -> SessionInvariantResult {
    if session.fee_spent > session.fee_cap {
        SessionInvariantResult::FeeCapExceeded {
            spent: session.fee_spent,
            cap: session.fee_cap,
        }
    } else {
        SessionInvariantResult::Valid
    }
}

/// S2/S3: Session counters match what was actually sent
pub fn check_session_counters(
    session: &Session,
    messages_sent: u64,
    fees_sent: u64,
) -> SessionInvariantResult {
    if session.nonce != messages_sent {
        return SessionInvariantResult::NonceMismatch {
            nonce: session.nonce,
            sent: messages_sent,
        };
    }
    if session.fee_spent != fees_sent {
        return SessionInvariantResult::FeeSpentMismatch {
            spent: session.fee_spent,
            sent: fees_sent,
        };
    }
    SessionInvariantResult::Valid
}

/// S4: Expiry window
pub fn check_expiry_window(session: &Session) -> SessionInvariantResult {
    if session.created_at.checked_add(session.ttl_slots) != Some(session.expires_at) {
        SessionInvariantResult::ExpiryMismatch {
            expires_at: session.expires_at,
            created_at: session.created_at,
            ttl_slots: session.ttl_slots,
        }
    } else {
        SessionInvariantResult::Valid
    }
}

/// S5: Monotonic nonce
pub fn check_nonce_monotonic(before: u64, after: u64) -> SessionInvariantResult {
    if after < before {
        SessionInvariantResult::NonceRegressed { before, after }
    } else {
        SessionInvariantResult::Valid
    }
}

// ============================================================================
// Outbox Invariants
// ============================================================================

/// O1-O4: Outbox is an append-only, hash-chained log of its entries
pub fn check_outbox_log(outbox: &Outbox, entries: &[OutboxEntry]) -> OutboxInvariantResult {
    let stored = entries.len() as u64;
    if outbox.entry_count != stored {
        return OutboxInvariantResult::CountMismatch {
            entry_count: outbox.entry_count,
            stored,
        };
    }

    let mut chain = [0u8; HASH_SIZE];
    for (position, entry) in entries.iter().enumerate() {
        let position = position as u64;
        if entry.index != position {
            return OutboxInvariantResult::IndexGap {
                position,
                index: entry.index,
            };
        }
        if entry.expected_id().ok() != Some(entry.entry_id) {
            return OutboxInvariantResult::EntryIdMismatch { index: entry.index };
        }
        chain = next_chain_hash(&chain, &entry.entry_id);
    }

    if chain != outbox.chain_hash {
        return OutboxInvariantResult::ChainMismatch;
    }
    OutboxInvariantResult::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_ledger() {
        let mut vault = FeeVault::default();
        vault.credit(100).unwrap();
        vault.debit(40).unwrap();
        assert_eq!(check_vault_ledger(&vault), VaultInvariantResult::Valid);

        vault.balance = 61;
        assert_eq!(
            check_vault_ledger(&vault),
            VaultInvariantResult::LedgerMismatch {
                balance: 61,
                deposited: 100,
                debited: 40,
            }
        );
    }

    #[test]
    fn test_vault_backing() {
        let mut vault = FeeVault::default();
        vault.credit(100).unwrap();
        assert_eq!(check_vault_backing(&vault, 150, 50), VaultInvariantResult::Valid);
        assert_eq!(
            check_vault_backing(&vault, 149, 50),
            VaultInvariantResult::LamportShortfall {
                lamports: 149,
                required: 150,
            }
        );
    }

    #[test]
    fn test_fee_cap() {
        let mut session = Session {
            fee_cap: 10,
            fee_spent: 10,
            ..Session::default()
        };
        assert_eq!(check_fee_cap(&session), SessionInvariantResult::Valid);
        session.fee_spent = 11;
        assert_eq!(
            check_fee_cap(&session),
            SessionInvariantResult::FeeCapExceeded { spent: 11, cap: 10 }
        );
    }

    #[test]
    fn test_session_counters() {
        let session = Session {
            nonce: 2,
            fee_spent: 30,
            ..Session::default()
        };
        assert_eq!(check_session_counters(&session, 2, 30), SessionInvariantResult::Valid);
        assert_eq!(
            check_session_counters(&session, 3, 30),
            SessionInvariantResult::NonceMismatch { nonce: 2, sent: 3 }
        );
        assert_eq!(
            check_session_counters(&session, 2, 31),
            SessionInvariantResult::FeeSpentMismatch { spent: 30, sent: 31 }
        );
    }

    #[test]
    fn test_nonce_monotonic() {
        assert_eq!(check_nonce_monotonic(1, 2), SessionInvariantResult::Valid);
        assert_eq!(check_nonce_monotonic(2, 2), SessionInvariantResult::Valid);
        assert_eq!(
            check_nonce_monotonic(2, 1),
            SessionInvariantResult::NonceRegressed { before: 2, after: 1 }
        );
    }

    #[test]
    fn test_empty_outbox_is_valid() {
        assert_eq!(
            check_outbox_log(&Outbox::default(), &[]),
            OutboxInvariantResult::Valid
        );
    }

    #[test]
    fn test_outbox_count_mismatch() {
        let outbox = Outbox {
            entry_count: 1,
            ..Outbox::default()
        };
        assert_eq!(
            check_outbox_log(&outbox, &[]),
            OutboxInvariantResult::CountMismatch {
                entry_count: 1,
                stored: 0,
            }
        );
    }
}
