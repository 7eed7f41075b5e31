//! Fuzz test runner for the Sonic Router
//!
//! Run with: cargo run --release -p sonic-router-fuzz
//! Or: cargo test -p sonic-router-fuzz (for property-based tests)

use anchor_lang::prelude::Pubkey;
use proptest::prelude::*;
use sonic_router::message::{GridMessage, GridPayload};
use sonic_router_fuzz::*;
use std::time::Instant;

fn main() {
    println!("=== Sonic Router Fuzz Testing ===\n");

    let start = Instant::now();
    let mut total_tests = 0;
    let mut passed = 0;
    let mut failed = 0;

    println!("Running open_session fuzz tests...");
    let (p, f) = run_open_session_fuzz(200);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running send_message fuzz tests...");
    let (p, f) = run_send_message_fuzz(200);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running session lifecycle fuzz tests...");
    let (p, f) = run_lifecycle_fuzz(100);
    passed += p;
    failed += f;
    total_tests += p + f;

    println!("Running edge case tests...");
    let (p, f) = run_edge_case_tests();
    passed += p;
    failed += f;
    total_tests += p + f;

    let duration = start.elapsed();

    println!("\n=== Fuzz Testing Complete ===");
    println!("Total tests: {}", total_tests);
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!("Duration: {:?}", duration);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn run_open_session_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let mut runner = proptest::test_runner::TestRunner::default();

    for i in 0..iterations {
        let input = any::<OpenSessionInput>()
            .new_tree(&mut runner)
            .expect("Failed to generate OpenSessionInput")
            .current();

        let mut ledger = SimulatedLedger::new(input.owner, input.current_slot);
        let result = ledger.open_session(
            input.grid_id,
            input.allowed_programs,
            input.allowed_opcodes,
            input.ttl_slots,
            input.fee_cap,
        );

        if result.is_invariant_violation() {
            println!("  [FAIL] Iteration {}: {:?}", i, result);
            failed += 1;
        } else {
            passed += 1;
        }
    }

    println!("  open_session: {} passed, {} failed", passed, failed);
    (passed, failed)
}

fn run_send_message_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let mut runner = proptest::test_runner::TestRunner::default();

    for i in 0..iterations {
        let input = any::<SendMessageInput>()
            .new_tree(&mut runner)
            .expect("Failed to generate SendMessageInput")
            .current();

        let mut ledger = SimulatedLedger::new(input.owner, 1_000);
        ledger.open_session(input.grid_id, input.allowed_programs.clone(), vec![], 100, input.fee_cap);
        ledger.deposit_fee(input.deposit);
        ledger.advance_slots(input.elapsed_slots);

        let result = match ledger.session(input.grid_id).cloned() {
            Some(session) => {
                let message = input.message.build(&session);
                ledger.send_message(input.grid_id, &message, input.fee_budget)
            }
            None => SimulationResult::InvariantViolation("session was not opened".to_string()),
        };

        if result.is_invariant_violation() {
            println!("  [FAIL] Iteration {}: {:?}", i, result);
            failed += 1;
        } else {
            passed += 1;
        }
    }

    println!("  send_message: {} passed, {} failed", passed, failed);
    (passed, failed)
}

fn run_lifecycle_fuzz(iterations: usize) -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let mut runner = proptest::test_runner::TestRunner::default();

    for i in 0..iterations {
        let seq = any::<SessionLifecycleSequence>()
            .new_tree(&mut runner)
            .expect("Failed to generate SessionLifecycleSequence")
            .current();

        let (results, _) = run_lifecycle(&seq);

        if let Some(violation) = results.iter().find(|r| r.is_invariant_violation()) {
            println!("  [FAIL] Iteration {}: {:?}", i, violation);
            failed += 1;
        } else {
            passed += 1;
        }
    }

    println!("  session_lifecycle: {} passed, {} failed", passed, failed);
    (passed, failed)
}

fn invoke(grid_id: u64, nonce: u64) -> GridMessage {
    GridMessage {
        grid_id,
        nonce,
        ttl_slots: 1,
        payload: GridPayload::Invoke {
            target_program: Default::default(),
            accounts: vec![],
            data: vec![],
        },
    }
}

fn run_edge_case_tests() -> (usize, usize) {
    let mut passed = 0;
    let mut failed = 0;

    let mut record = |name: &str, ok: bool| {
        if ok {
            passed += 1;
        } else {
            println!("  [FAIL] {}", name);
            failed += 1;
        }
    };

    // Fee budget exactly equal to the cap and the vault balance
    {
        let mut ledger = SimulatedLedger::new(Pubkey::new_unique(), 0);
        ledger.open_session(0, vec![], vec![], 10, 500);
        ledger.deposit_fee(500);
        let result = ledger.send_message(0, &invoke(0, 0), 500);
        record(
            "fee budget at cap",
            result.is_success() && ledger.vault_balance() == 0,
        );
    }

    // Sending in the expiry slot
    {
        let mut ledger = SimulatedLedger::new(Pubkey::new_unique(), 0);
        ledger.open_session(0, vec![], vec![], 10, 500);
        ledger.deposit_fee(500);
        ledger.advance_slots(10);
        let result = ledger.send_message(0, &invoke(0, 0), 1);
        record("send at expires_at", result.is_error_named("SessionExpired"));
    }

    // Session expiry overflowing u64
    {
        let mut ledger = SimulatedLedger::new(Pubkey::new_unique(), u64::MAX);
        let result = ledger.open_session(0, vec![], vec![], 1, 1);
        record("expiry overflow", result.is_error_named("ArithmeticOverflow"));
    }

    // Deposit that would overflow the vault
    {
        let mut ledger = SimulatedLedger::new(Pubkey::new_unique(), 0);
        ledger.deposit_fee(u64::MAX / 2);
        let result = ledger.deposit_fee(u64::MAX);
        record("deposit overflow", result.is_error() && !result.is_invariant_violation());
    }

    // Zero-fee messages still advance the nonce
    {
        let mut ledger = SimulatedLedger::new(Pubkey::new_unique(), 0);
        ledger.open_session(0, vec![], vec![], 10, 1);
        ledger.deposit_fee(1);
        let first = ledger.send_message(0, &invoke(0, 0), 0);
        let second = ledger.send_message(0, &invoke(0, 1), 0);
        record(
            "zero fee budget",
            first.is_success()
                && second.is_success()
                && ledger.session(0).map(|s| s.nonce) == Some(2),
        );
    }

    println!("  edge_cases: {} passed, {} failed", passed, failed);
    (passed, failed)
}
