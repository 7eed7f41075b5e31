//! Fuzz target for open_session instruction
//!
//! Tests invariants:
//! - Allowlists are bounded and only hold known opcodes
//! - Zero TTL or fee cap is rejected
//! - S4: expires_at == created_at + ttl_slots
//!
//! Run with: cargo test --release -p sonic-router-fuzz open_session

use crate::*;
use proptest::prelude::*;
use sonic_router::message::EmbeddedOpcode;
use sonic_router::state::Session;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Fuzz open_session with arbitrary inputs
    /// Success exactly when every argument is within bounds
    #[test]
    fn fuzz_open_session(input in any::<OpenSessionInput>()) {
        let mut ledger = SimulatedLedger::new(input.owner, input.current_slot);

        let expect_ok = input.allowed_programs.len() <= Session::MAX_ALLOWED_PROGRAMS
            && input.allowed_opcodes.len() <= Session::MAX_ALLOWED_OPCODES
            && input.allowed_opcodes.iter().all(|&op| EmbeddedOpcode::from_u8(op).is_some())
            && input.ttl_slots > 0
            && input.fee_cap > 0
            && input.current_slot.checked_add(input.ttl_slots).is_some();

        let result = ledger.open_session(
            input.grid_id,
            input.allowed_programs.clone(),
            input.allowed_opcodes.clone(),
            input.ttl_slots,
            input.fee_cap,
        );

        prop_assert!(!result.is_invariant_violation(),
            "Invariant violation: {:?}\nInput: {:?}", result, input);
        prop_assert_eq!(result.is_success(), expect_ok,
            "Unexpected outcome {:?} for {:?}", result, input);

        if result.is_success() {
            let session = ledger.session(input.grid_id).unwrap();
            prop_assert_eq!(session.owner, input.owner);
            prop_assert_eq!(session.nonce, 0);
            prop_assert_eq!(session.fee_spent, 0);
            prop_assert_eq!(session.expires_at, input.current_slot + input.ttl_slots);
            prop_assert_eq!(&session.allowed_programs, &input.allowed_programs);
        } else {
            prop_assert!(ledger.session(input.grid_id).is_none());
        }
    }

    /// A second open on the same grid fails until the first is closed
    #[test]
    fn fuzz_open_session_twice(
        owner in arb_pubkey(),
        grid_id in arb_grid_id(),
        ttl_slots in 1u64..1_000u64,
        elapsed in 0u64..2_000u64,
    ) {
        let mut ledger = SimulatedLedger::new(owner, 1_000);
        prop_assert!(ledger.open_session(grid_id, vec![], vec![], ttl_slots, 1).is_success());
        let original = ledger.session(grid_id).unwrap().clone();

        ledger.advance_slots(elapsed);
        let result = ledger.open_session(grid_id, vec![], vec![], ttl_slots, 1);

        let expected = if elapsed >= ttl_slots {
            "SessionPendingClose"
        } else {
            "SessionAlreadyActive"
        };
        prop_assert!(result.is_error_named(expected), "{:?}", result);
        prop_assert_eq!(ledger.session(grid_id).unwrap().created_at, original.created_at);
    }

    /// Sessions on different grids are independent
    #[test]
    fn fuzz_open_session_distinct_grids(
        owner in arb_pubkey(),
        grids in prop::collection::btree_set(any::<u64>(), 1..8),
    ) {
        let mut ledger = SimulatedLedger::new(owner, 0);
        for grid_id in &grids {
            prop_assert!(ledger.open_session(*grid_id, vec![], vec![], 10, 10).is_success());
        }
        prop_assert_eq!(ledger.sessions.len(), grids.len());
    }
}
