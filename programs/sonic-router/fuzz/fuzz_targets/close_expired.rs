//! Fuzz target for close_expired instruction
//!
//! Tests invariants:
//! - Sessions close only at or after expires_at
//! - Closing frees the grid for a fresh session with nonce 0
//!
//! Run with: cargo test --release -p sonic-router-fuzz close_expired

use crate::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fuzz_close_expired_timing(
        owner in arb_pubkey(),
        grid_id in arb_grid_id(),
        start_slot in 0u64..1_000_000u64,
        ttl_slots in 1u64..10_000u64,
        elapsed in 0u64..20_000u64,
    ) {
        let mut ledger = SimulatedLedger::new(owner, start_slot);
        prop_assert!(ledger.open_session(grid_id, vec![], vec![], ttl_slots, 1).is_success());
        ledger.advance_slots(elapsed);

        let result = ledger.close_expired(grid_id);
        prop_assert!(!result.is_invariant_violation(), "{:?}", result);

        if elapsed >= ttl_slots {
            prop_assert!(result.is_success(), "{:?}", result);
            prop_assert!(ledger.session(grid_id).is_none());
        } else {
            prop_assert!(result.is_error_named("SessionNotExpired"), "{:?}", result);
            prop_assert!(ledger.session(grid_id).is_some());
        }
    }

    #[test]
    fn fuzz_close_missing_session(owner in arb_pubkey(), grid_id in arb_grid_id()) {
        let mut ledger = SimulatedLedger::new(owner, 0);
        prop_assert!(ledger.close_expired(grid_id).is_error_named("AccountNotInitialized"));
    }

    /// Entries committed before a close survive it and reopening resets the nonce
    #[test]
    fn fuzz_close_and_reopen(
        owner in arb_pubkey(),
        sends in 0u64..5u64,
        ttl_slots in 1u64..100u64,
    ) {
        let mut ledger = SimulatedLedger::new(owner, 10);
        ledger.open_session(1, vec![], vec![], ttl_slots, 1_000);
        ledger.deposit_fee(1_000);
        for nonce in 0..sends {
            let message = sonic_router::message::GridMessage {
                grid_id: 1,
                nonce,
                ttl_slots: 5,
                payload: sonic_router::message::GridPayload::Invoke {
                    target_program: owner,
                    accounts: vec![],
                    data: vec![],
                },
            };
            prop_assert!(ledger.send_message(1, &message, 10).is_success());
        }

        ledger.advance_slots(ttl_slots);
        prop_assert!(ledger.close_expired(1).is_success());
        prop_assert_eq!(ledger.entries.len() as u64, sends);

        prop_assert!(ledger.open_session(1, vec![], vec![], ttl_slots, 1_000).is_success());
        prop_assert_eq!(ledger.session(1).unwrap().nonce, 0);
        prop_assert_eq!(ledger.check_invariants(), None);
    }
}
