//! Fuzz target for full session lifecycles
//!
//! Applies random sequences of open/deposit/send/advance/close to one owner
//! and checks every ledger invariant after each step.
//!
//! Run with: cargo test --release -p sonic-router-fuzz session_lifecycle

use std::collections::BTreeMap;

use crate::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn fuzz_session_lifecycle(seq in any::<SessionLifecycleSequence>()) {
        let (results, ledger) = run_lifecycle(&seq);

        for (step, result) in results.iter().enumerate() {
            prop_assert!(!result.is_invariant_violation(),
                "Step {} ({:?}): {:?}", step, seq.ops[step], result);
        }

        // Nonces across live sessions never exceed the number of entries
        let live_nonces: u64 = ledger.sessions.values().map(|s| s.nonce).sum();
        prop_assert!(live_nonces <= ledger.entries.len() as u64);
    }

    /// Outbox indices only grow, whatever happens to sessions
    #[test]
    fn fuzz_outbox_append_only(seq in any::<SessionLifecycleSequence>()) {
        let mut ledger = SimulatedLedger::new(seq.owner, seq.start_slot);
        let mut last_count = 0u64;
        let mut last_chain = [0u8; 32];

        for op in &seq.ops {
            apply_lifecycle_op(&mut ledger, op);
            if let Some(outbox) = &ledger.outbox {
                prop_assert!(outbox.entry_count >= last_count);
                if outbox.entry_count == last_count {
                    prop_assert_eq!(outbox.chain_hash, last_chain);
                }
                last_count = outbox.entry_count;
                last_chain = outbox.chain_hash;
            }
        }
    }

    /// Session nonces never go backwards; a closed session's history ends
    #[test]
    fn fuzz_nonce_monotonic(seq in any::<SessionLifecycleSequence>()) {
        let mut ledger = SimulatedLedger::new(seq.owner, seq.start_slot);
        let mut last_nonce: BTreeMap<u64, u64> = BTreeMap::new();

        for (step, op) in seq.ops.iter().enumerate() {
            apply_lifecycle_op(&mut ledger, op);
            last_nonce.retain(|grid_id, _| ledger.sessions.contains_key(grid_id));

            for (grid_id, session) in &ledger.sessions {
                let before = last_nonce.get(grid_id).copied().unwrap_or(0);
                let result = check_nonce_monotonic(before, session.nonce);
                prop_assert_eq!(result, SessionInvariantResult::Valid,
                    "Step {} ({:?}) grid {}", step, op, grid_id);
                last_nonce.insert(*grid_id, session.nonce);
            }
        }
    }
}
