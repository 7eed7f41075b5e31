//! Fuzz testing scenarios that simulate instruction execution
//!
//! [`SimulatedLedger`] holds one owner's accounts and runs each instruction
//! through the router's own state transitions, without the Solana runtime.
//! A failed instruction restores the ledger to its state before the call,
//! the way a failed transaction leaves accounts untouched.

use std::collections::BTreeMap;

use anchor_lang::error::{Error, ErrorCode};
use anchor_lang::prelude::{require, Pubkey, Rent};
use anchor_lang::Result;
use sonic_router::errors::RouterError;
use sonic_router::instructions::{authorize_send, commit_send};
use sonic_router::message::GridMessage;
use sonic_router::state::{FeeVault, Outbox, OutboxEntry, Session};
use sonic_router::utils::pda::{
    fee_vault_address, outbox_address, outbox_entry_address, session_address,
};

use crate::arbitrary::{LifecycleOp, SessionLifecycleSequence};
use crate::invariants::*;

/// Result of a simulated instruction execution
#[derive(Debug, Clone)]
pub enum SimulationResult {
    Success,
    Error(String),
    InvariantViolation(String),
}

impl SimulationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationResult::Success)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SimulationResult::Error(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SimulationResult::InvariantViolation(_))
    }

    /// True if the instruction failed with the named error
    pub fn is_error_named(&self, name: &str) -> bool {
        matches!(self, SimulationResult::Error(e) if e == name)
    }
}

/// Name of a router or framework error, e.g. "InvalidNonce"
pub fn error_name(err: &Error) -> String {
    match err {
        Error::AnchorError(e) => e.error_name.clone(),
        Error::ProgramError(e) => e.program_error.to_string(),
    }
}

/// Messages and fees sent under the current incarnation of a session
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTally {
    pub messages: u64,
    pub fees: u64,
}

/// Accounts belonging to one owner
#[derive(Debug, Clone)]
pub struct SimulatedLedger {
    pub owner: Pubkey,
    pub current_slot: u64,
    pub rent: Rent,
    pub sessions: BTreeMap<u64, Session>,
    pub tallies: BTreeMap<u64, SessionTally>,
    pub fee_vault: Option<FeeVault>,
    pub vault_lamports: u64,
    pub outbox: Option<Outbox>,
    pub entries: Vec<OutboxEntry>,
    pub entry_lamports: Vec<u64>,
}

impl SimulatedLedger {
    pub fn new(owner: Pubkey, current_slot: u64) -> Self {
        Self {
            owner,
            current_slot,
            rent: Rent::default(),
            sessions: BTreeMap::new(),
            tallies: BTreeMap::new(),
            fee_vault: None,
            vault_lamports: 0,
            outbox: None,
            entries: Vec::new(),
            entry_lamports: Vec::new(),
        }
    }

    pub fn advance_slots(&mut self, slots: u64) {
        self.current_slot = self.current_slot.saturating_add(slots);
    }

    pub fn session(&self, grid_id: u64) -> Option<&Session> {
        self.sessions.get(&grid_id)
    }

    pub fn vault_balance(&self) -> u64 {
        self.fee_vault.as_ref().map(|v| v.balance).unwrap_or(0)
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    /// Simulate open_session
    pub fn open_session(
        &mut self,
        grid_id: u64,
        allowed_programs: Vec<Pubkey>,
        allowed_opcodes: Vec<u8>,
        ttl_slots: u64,
        fee_cap: u64,
    ) -> SimulationResult {
        self.transact(|ledger| {
            if let Some(existing) = ledger.sessions.get(&grid_id) {
                existing.ensure_vacant(ledger.current_slot)?;
            }
            let (_, bump) = session_address(&ledger.owner, grid_id);
            let session = Session::new(
                ledger.owner,
                grid_id,
                allowed_programs,
                allowed_opcodes,
                ttl_slots,
                fee_cap,
                ledger.current_slot,
                bump,
            )?;
            ledger.sessions.insert(grid_id, session);
            ledger.tallies.insert(grid_id, SessionTally::default());
            Ok(())
        })
    }

    /// Simulate deposit_fee
    pub fn deposit_fee(&mut self, amount: u64) -> SimulationResult {
        self.transact(|ledger| {
            require!(amount > 0, RouterError::InvalidDepositAmount);

            let rent_exempt_minimum = ledger.rent.minimum_balance(FeeVault::SIZE);
            if ledger.fee_vault.is_none() {
                ledger.vault_lamports = rent_exempt_minimum;
            }
            let owner = ledger.owner;
            let vault = ledger.fee_vault.get_or_insert_with(|| FeeVault {
                owner,
                bump: fee_vault_address(&owner).1,
                ..FeeVault::default()
            });

            ledger.vault_lamports = ledger
                .vault_lamports
                .checked_add(amount)
                .ok_or(RouterError::ArithmeticOverflow)?;
            vault.credit(amount)?;
            vault.reconcile(ledger.vault_lamports, rent_exempt_minimum)
        })
    }

    /// Simulate send_message
    pub fn send_message(
        &mut self,
        grid_id: u64,
        message: &GridMessage,
        fee_budget: u64,
    ) -> SimulationResult {
        self.transact(|ledger| {
            let slot = ledger.current_slot;
            let owner = ledger.owner;
            let session = ledger
                .sessions
                .get_mut(&grid_id)
                .ok_or(ErrorCode::AccountNotInitialized)?;
            let vault = ledger
                .fee_vault
                .as_mut()
                .ok_or(ErrorCode::AccountNotInitialized)?;

            authorize_send(session, vault, grid_id, message, fee_budget, slot)?;
            vault.reconcile(
                ledger.vault_lamports,
                ledger.rent.minimum_balance(FeeVault::SIZE),
            )?;

            let (outbox_key, outbox_bump) = outbox_address(&owner);
            let outbox = ledger.outbox.get_or_insert_with(|| Outbox {
                authority: owner,
                bump: outbox_bump,
                ..Outbox::default()
            });

            let (session_key, _) = session_address(&owner, grid_id);
            let entry_id = OutboxEntry::compute_id(
                &owner,
                &session_key,
                outbox.entry_count,
                fee_budget,
                message,
            )?;
            let committed = commit_send(session, vault, outbox, entry_id, fee_budget, slot)?;

            ledger.vault_lamports = ledger
                .vault_lamports
                .checked_sub(fee_budget)
                .ok_or(RouterError::InsufficientFunds)?;
            let entry_rent = ledger
                .rent
                .minimum_balance(OutboxEntry::space_for(message));
            ledger.entry_lamports.push(
                entry_rent
                    .checked_add(fee_budget)
                    .ok_or(RouterError::ArithmeticOverflow)?,
            );
            ledger.entries.push(OutboxEntry {
                outbox: outbox_key,
                authority: owner,
                session: session_key,
                index: committed.entry_index,
                fee_budget,
                committed_slot: slot,
                entry_id,
                bump: outbox_entry_address(&outbox_key, committed.entry_index).1,
                message: message.clone(),
            });

            let tally = ledger.tallies.entry(grid_id).or_default();
            tally.messages += 1;
            tally.fees += fee_budget;
            Ok(())
        })
    }

    /// Simulate close_expired
    pub fn close_expired(&mut self, grid_id: u64) -> SimulationResult {
        self.transact(|ledger| {
            let session = ledger
                .sessions
                .get(&grid_id)
                .ok_or(ErrorCode::AccountNotInitialized)?;
            session.ensure_closable(ledger.current_slot)?;
            ledger.sessions.remove(&grid_id);
            ledger.tallies.remove(&grid_id);
            Ok(())
        })
    }

    /// Run `f` as one transaction: roll back on error, then check invariants.
    fn transact<F>(&mut self, f: F) -> SimulationResult
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let snapshot = self.clone();
        match f(self) {
            Ok(()) => match self.check_invariants() {
                Some(violation) => SimulationResult::InvariantViolation(violation),
                None => SimulationResult::Success,
            },
            Err(err) => {
                *self = snapshot;
                SimulationResult::Error(error_name(&err))
            }
        }
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// First violated invariant, if any
    pub fn check_invariants(&self) -> Option<String> {
        if let Some(vault) = &self.fee_vault {
            let rent_exempt_minimum = self.rent.minimum_balance(FeeVault::SIZE);
            for result in [
                check_vault_ledger(vault),
                check_vault_backing(vault, self.vault_lamports, rent_exempt_minimum),
                check_fee_conservation(vault, &self.entries),
            ] {
                if result != VaultInvariantResult::Valid {
                    return Some(format!("fee vault: {:?}", result));
                }
            }
        } else if !self.entries.is_empty() {
            return Some("entries committed without a fee vault".to_string());
        }

        for (grid_id, session) in &self.sessions {
            let tally = self.tallies.get(grid_id).copied().unwrap_or_default();
            for result in [
                check_fee_cap(session),
                check_session_counters(session, tally.messages, tally.fees),
                check_expiry_window(session),
            ] {
                if result != SessionInvariantResult::Valid {
                    return Some(format!("session {}: {:?}", grid_id, result));
                }
            }
        }

        let outbox_result = match &self.outbox {
            Some(outbox) => check_outbox_log(outbox, &self.entries),
            None if self.entries.is_empty() => OutboxInvariantResult::Valid,
            None => return Some("entries committed without an outbox".to_string()),
        };
        if outbox_result != OutboxInvariantResult::Valid {
            return Some(format!("outbox: {:?}", outbox_result));
        }

        for (entry, lamports) in self.entries.iter().zip(&self.entry_lamports) {
            let expected = self
                .rent
                .minimum_balance(OutboxEntry::space_for(&entry.message))
                .saturating_add(entry.fee_budget);
            if *lamports != expected {
                return Some(format!(
                    "entry {} holds {} lamports, expected {}",
                    entry.index, lamports, expected
                ));
            }
        }

        None
    }
}

// ============================================================================
// Lifecycle Scenarios
// ============================================================================

/// Apply one lifecycle step to `ledger`
pub fn apply_lifecycle_op(ledger: &mut SimulatedLedger, op: &LifecycleOp) -> SimulationResult {
    match op {
        LifecycleOp::Open {
            grid_id,
            ttl_slots,
            fee_cap,
            restrict_programs,
        } => {
            let allowed_programs = if *restrict_programs {
                vec![ledger.owner]
            } else {
                Vec::new()
            };
            ledger.open_session(*grid_id, allowed_programs, Vec::new(), *ttl_slots, *fee_cap)
        }
        LifecycleOp::Deposit { amount } => ledger.deposit_fee(*amount),
        LifecycleOp::Send {
            grid_id,
            fee_budget,
            message,
        } => {
            let session = ledger.session(*grid_id).cloned().unwrap_or(Session {
                grid_id: *grid_id,
                ..Session::default()
            });
            let message = message.build(&session);
            ledger.send_message(*grid_id, &message, *fee_budget)
        }
        LifecycleOp::AdvanceSlots { slots } => {
            ledger.advance_slots(*slots);
            SimulationResult::Success
        }
        LifecycleOp::Close { grid_id } => ledger.close_expired(*grid_id),
    }
}

/// Run a whole sequence from an empty ledger
pub fn run_lifecycle(seq: &SessionLifecycleSequence) -> (Vec<SimulationResult>, SimulatedLedger) {
    let mut ledger = SimulatedLedger::new(seq.owner, seq.start_slot);
    let results = seq
        .ops
        .iter()
        .map(|op| apply_lifecycle_op(&mut ledger, op))
        .collect();
    (results, ledger)
}
