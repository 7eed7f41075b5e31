//! Fuzz target for send_message instruction
//!
//! Tests invariants:
//! - Validation order: expiry, grid, allowlists, nonce, limits, fee cap, balance
//! - S1: cumulative fee cap, S2: nonce equals messages sent
//! - V3: exactly fee_budget moves from the vault into the entry
//! - O1-O4: outbox stays a consecutive, hash-chained log
//!
//! Run with: cargo test --release -p sonic-router-fuzz send_message

use crate::*;
use proptest::prelude::*;
use sonic_router::instructions::constants::{MAX_INVOKE_ACCOUNTS, MAX_INVOKE_DATA_LEN};
use sonic_router::message::{GridMessage, GridPayload};
use sonic_router::state::Session;

const START_SLOT: u64 = 1_000;
const SESSION_TTL: u64 = 100;

/// Error the router must report for this send, or None if it must succeed
fn expected_error(
    session: &Session,
    vault_balance: Option<u64>,
    grid_id: u64,
    message: &GridMessage,
    fee_budget: u64,
    slot: u64,
) -> Option<&'static str> {
    let balance = match vault_balance {
        Some(balance) => balance,
        None => return Some("AccountNotInitialized"),
    };
    if slot >= session.expires_at {
        return Some("SessionExpired");
    }
    if message.grid_id != grid_id {
        return Some("InvalidGridId");
    }
    if let GridPayload::Invoke { target_program, .. } = &message.payload {
        if !session.allowed_programs.is_empty()
            && !session.allowed_programs.contains(target_program)
        {
            return Some("ProgramNotAllowed");
        }
    }
    if message.nonce != session.nonce {
        return Some("InvalidNonce");
    }
    if message.ttl_slots == 0 {
        return Some("InvalidMessageTtl");
    }
    match &message.payload {
        GridPayload::Invoke { accounts, data, .. } => {
            if accounts.len() > MAX_INVOKE_ACCOUNTS {
                return Some("TooManyInvokeAccounts");
            }
            if data.len() > MAX_INVOKE_DATA_LEN {
                return Some("MessageTooLarge");
            }
        }
        GridPayload::Embedded { params, .. } => {
            if params.amount_in == 0 || params.slippage_bps > 10000 {
                return Some("InvalidEmbeddedParams");
            }
        }
    }
    if fee_budget > session.fee_cap - session.fee_spent {
        return Some("FeeCapExceeded");
    }
    if fee_budget > balance {
        return Some("InsufficientFunds");
    }
    None
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Fuzz a single send against a freshly opened session
    #[test]
    fn fuzz_send_message(input in any::<SendMessageInput>()) {
        let mut ledger = SimulatedLedger::new(input.owner, START_SLOT);
        prop_assert!(ledger
            .open_session(input.grid_id, input.allowed_programs.clone(), vec![], SESSION_TTL, input.fee_cap)
            .is_success());
        if input.deposit > 0 {
            prop_assert!(ledger.deposit_fee(input.deposit).is_success());
        }
        ledger.advance_slots(input.elapsed_slots);

        let session = ledger.session(input.grid_id).unwrap().clone();
        let message = input.message.build(&session);
        let vault_balance = ledger.fee_vault.as_ref().map(|v| v.balance);
        let expected = expected_error(
            &session,
            vault_balance,
            input.grid_id,
            &message,
            input.fee_budget,
            ledger.current_slot,
        );

        let result = ledger.send_message(input.grid_id, &message, input.fee_budget);

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);

        match expected {
            None => {
                prop_assert!(result.is_success(), "Expected success, got {:?}", result);
                let after = ledger.session(input.grid_id).unwrap();
                prop_assert_eq!(after.nonce, 1);
                prop_assert_eq!(after.fee_spent, input.fee_budget);
                prop_assert_eq!(ledger.vault_balance(), input.deposit - input.fee_budget);
                prop_assert_eq!(ledger.entries.len(), 1);
                prop_assert_eq!(&ledger.entries[0].message, &message);
                prop_assert_eq!(ledger.entries[0].fee_budget, input.fee_budget);
            }
            Some(name) => {
                prop_assert!(result.is_error_named(name),
                    "Expected {}, got {:?}\nInput: {:?}", name, result, input);
                prop_assert_eq!(ledger.session(input.grid_id).unwrap().nonce, 0);
                prop_assert_eq!(ledger.vault_balance(), vault_balance.unwrap_or(0));
                prop_assert!(ledger.entries.is_empty());
                prop_assert!(ledger.outbox.is_none());
            }
        }
    }

    /// Consecutive sends consume consecutive nonces and fill consecutive indices
    #[test]
    fn fuzz_send_message_sequence(
        owner in arb_pubkey(),
        grid_id in arb_grid_id(),
        fees in prop::collection::vec(0u64..1_000u64, 1..20),
    ) {
        let mut ledger = SimulatedLedger::new(owner, START_SLOT);
        ledger.open_session(grid_id, vec![], vec![], SESSION_TTL, u64::MAX);
        ledger.deposit_fee(1_000_000);

        for (i, fee) in fees.iter().enumerate() {
            let session = ledger.session(grid_id).unwrap().clone();
            let message = GridMessage {
                grid_id,
                nonce: session.nonce,
                ttl_slots: 1,
                payload: GridPayload::Invoke {
                    target_program: owner,
                    accounts: vec![],
                    data: vec![i as u8],
                },
            };
            let result = ledger.send_message(grid_id, &message, *fee);
            prop_assert!(result.is_success(), "send {} failed: {:?}", i, result);
            prop_assert_eq!(ledger.entries[i].index, i as u64);
        }

        let total: u64 = fees.iter().sum();
        prop_assert_eq!(ledger.session(grid_id).unwrap().nonce, fees.len() as u64);
        prop_assert_eq!(ledger.vault_balance(), 1_000_000 - total);
        prop_assert_eq!(ledger.outbox.as_ref().unwrap().entry_count, fees.len() as u64);
    }

    /// A committed message can never be replayed
    #[test]
    fn fuzz_send_message_replay(
        owner in arb_pubkey(),
        message_input in any::<MessageInput>(),
    ) {
        let mut ledger = SimulatedLedger::new(owner, START_SLOT);
        ledger.open_session(0, vec![], vec![], SESSION_TTL, 1_000);
        ledger.deposit_fee(1_000);

        let session = ledger.session(0).unwrap().clone();
        let message = message_input.build(&session);
        if ledger.send_message(0, &message, 1).is_success() {
            let replay = ledger.send_message(0, &message, 1);
            prop_assert!(replay.is_error_named("InvalidNonce"), "{:?}", replay);
            prop_assert_eq!(ledger.entries.len(), 1);
        }
    }
}
