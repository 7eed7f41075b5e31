//! Commit a message to the owner's outbox for relay to a grid

use crate::errors::RouterError;
use crate::events::{EntryCommitted, OutboxCreated};
use crate::instructions::lamport_transfer::transfer_lamports;
use crate::message::GridMessage;
use crate::state::{
    FeeVault, Outbox, OutboxEntry, Session, FEE_VAULT_SEED, HASH_SIZE, OUTBOX_ENTRY_SEED,
    OUTBOX_SEED, SESSION_SEED,
};
use crate::utils::compute_budget::log_compute_units;
use anchor_lang::prelude::*;

use super::validation::validate_message;

#[derive(Accounts)]
#[instruction(grid_id: u64, message: GridMessage)]
pub struct SendMessage<'info> {
    #[account(
        mut,
        seeds = [SESSION_SEED, owner.key().as_ref(), &grid_id.to_le_bytes()],
        bump = session.bump,
        has_one = owner @ RouterError::UnauthorizedOwner
    )]
    pub session: Account<'info, Session>,

    #[account(
        mut,
        seeds = [FEE_VAULT_SEED, owner.key().as_ref()],
        bump = fee_vault.bump,
        has_one = owner @ RouterError::UnauthorizedOwner
    )]
    pub fee_vault: Account<'info, FeeVault>,

    #[account(
        init_if_needed,
        payer = owner,
        space = Outbox::SIZE,
        seeds = [OUTBOX_SEED, owner.key().as_ref()],
        bump
    )]
    pub outbox: Account<'info, Outbox>,

    /// Entry PDA at the outbox's next index
    #[account(
        init,
        payer = owner,
        space = OutboxEntry::space_for(&message),
        seeds = [OUTBOX_ENTRY_SEED, outbox.key().as_ref(), &outbox.entry_count.to_le_bytes()],
        bump
    )]
    pub entry: Account<'info, OutboxEntry>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Result of a successful commit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommittedSend {
    /// Outbox index the entry was stored at
    pub entry_index: u64,
    /// Session nonce consumed by the message
    pub nonce: u64,
}

/// Checks whether `message` may be sent under `session` with `fee_budget`.
///
/// Checks run in a fixed order so the first failing rule determines the error:
/// expiry, grid, program allowlist, opcode allowlist, nonce, message limits,
/// cumulative fee cap, vault balance.
pub fn authorize_send(
    session: &Session,
    vault: &FeeVault,
    grid_id: u64,
    message: &GridMessage,
    fee_budget: u64,
    current_slot: u64,
) -> Result<()> {
    require!(
        !session.is_expired(current_slot),
        RouterError::SessionExpired
    );
    require!(
        message.grid_id == grid_id && session.grid_id == grid_id,
        RouterError::InvalidGridId
    );

    if let Some(program) = message.target_program() {
        require!(
            session.is_program_allowed(program),
            RouterError::ProgramNotAllowed
        );
    }
    if let Some(opcode) = message.opcode() {
        require!(
            session.is_opcode_allowed(opcode),
            RouterError::OpcodeNotAllowed
        );
    }

    require!(message.nonce == session.nonce, RouterError::InvalidNonce);

    validate_message(message)?;

    require!(
        fee_budget <= session.remaining_fee_cap(),
        RouterError::FeeCapExceeded
    );
    require!(
        vault.has_sufficient_balance(fee_budget),
        RouterError::InsufficientFunds
    );

    Ok(())
}

/// Applies an authorized send to the ledger state: debits the vault, appends
/// `entry_id` to the outbox and advances the session.
///
/// Partial updates are discarded with the transaction if any step fails.
pub fn commit_send(
    session: &mut Session,
    vault: &mut FeeVault,
    outbox: &mut Outbox,
    entry_id: [u8; HASH_SIZE],
    fee_budget: u64,
    current_slot: u64,
) -> Result<CommittedSend> {
    vault.debit(fee_budget)?;
    let entry_index = outbox.append(entry_id, current_slot)?;
    let nonce = session.advance(fee_budget)?;
    Ok(CommittedSend { entry_index, nonce })
}

pub fn handler(
    ctx: Context<SendMessage>,
    grid_id: u64,
    message: GridMessage,
    fee_budget: u64,
) -> Result<()> {
    log_compute_units("send_message_start");

    let clock = Clock::get()?;
    let owner = ctx.accounts.owner.key();
    let session_key = ctx.accounts.session.key();
    let outbox_key = ctx.accounts.outbox.key();
    let entry_key = ctx.accounts.entry.key();

    authorize_send(
        &ctx.accounts.session,
        &ctx.accounts.fee_vault,
        grid_id,
        &message,
        fee_budget,
        clock.slot,
    )?;

    let rent_exempt_minimum = Rent::get()?.minimum_balance(FeeVault::SIZE);
    ctx.accounts.fee_vault.reconcile(
        ctx.accounts.fee_vault.to_account_info().lamports(),
        rent_exempt_minimum,
    )?;

    // Initialize on first use
    let outbox = &mut ctx.accounts.outbox;
    if !outbox.is_initialized() {
        outbox.authority = owner;
        outbox.bump = ctx.bumps.outbox;

        emit!(OutboxCreated {
            outbox: outbox_key,
            authority: owner,
            slot: clock.slot,
        });
    }

    let entry_id = OutboxEntry::compute_id(
        &owner,
        &session_key,
        outbox.entry_count,
        fee_budget,
        &message,
    )?;

    let committed = commit_send(
        &mut ctx.accounts.session,
        &mut ctx.accounts.fee_vault,
        &mut ctx.accounts.outbox,
        entry_id,
        fee_budget,
        clock.slot,
    )?;

    // Fee moves with the entry as the relay bounty
    transfer_lamports(
        &ctx.accounts.fee_vault.to_account_info(),
        &ctx.accounts.entry.to_account_info(),
        fee_budget,
    )?;

    ctx.accounts.entry.set_inner(OutboxEntry {
        outbox: outbox_key,
        authority: owner,
        session: session_key,
        index: committed.entry_index,
        fee_budget,
        committed_slot: clock.slot,
        entry_id,
        bump: ctx.bumps.entry,
        message: message.clone(),
    });

    emit!(EntryCommitted {
        entry: entry_key,
        entry_id,
        outbox: outbox_key,
        session: session_key,
        grid_id,
        entry_index: committed.entry_index,
        nonce: committed.nonce,
        fee_budget,
        chain_hash: ctx.accounts.outbox.chain_hash,
        message,
        slot: clock.slot,
    });

    log_compute_units("send_message_end");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EmbeddedOpcode, EmbeddedParams, GridPayload};
    use crate::state::next_chain_hash;

    const GRID: u64 = 7;
    const NOW: u64 = 1_000;

    fn session(programs: Vec<Pubkey>, opcodes: Vec<u8>, fee_cap: u64) -> Session {
        Session::new(
            Pubkey::new_unique(),
            GRID,
            programs,
            opcodes,
            100,
            fee_cap,
            NOW,
            254,
        )
        .unwrap()
    }

    fn vault(balance: u64) -> FeeVault {
        let mut vault = FeeVault {
            owner: Pubkey::new_unique(),
            ..FeeVault::default()
        };
        vault.credit(balance).unwrap();
        vault
    }

    fn invoke(target_program: Pubkey, nonce: u64) -> GridMessage {
        GridMessage {
            grid_id: GRID,
            nonce,
            ttl_slots: 50,
            payload: GridPayload::Invoke {
                target_program,
                accounts: vec![],
                data: vec![1, 2, 3],
            },
        }
    }

    fn swap(nonce: u64) -> GridMessage {
        GridMessage {
            grid_id: GRID,
            nonce,
            ttl_slots: 50,
            payload: GridPayload::Embedded {
                opcode: EmbeddedOpcode::Swap,
                params: EmbeddedParams {
                    in_mint: Pubkey::new_unique(),
                    out_mint: Pubkey::new_unique(),
                    amount_in: 10,
                    slippage_bps: 100,
                    deadline_slot: NOW + 10,
                    expected_plan_hash: [0u8; 32],
                },
            },
        }
    }

    fn send(
        session: &mut Session,
        vault: &mut FeeVault,
        outbox: &mut Outbox,
        message: &GridMessage,
        fee_budget: u64,
        slot: u64,
    ) -> Result<CommittedSend> {
        authorize_send(session, vault, GRID, message, fee_budget, slot)?;
        let entry_id = OutboxEntry::compute_id(
            &session.owner,
            &Pubkey::default(),
            outbox.entry_count,
            fee_budget,
            message,
        )?;
        commit_send(session, vault, outbox, entry_id, fee_budget, slot)
    }

    #[test]
    fn test_send_advances_nonce_and_debits_exact_fee() {
        let target = Pubkey::new_unique();
        let mut session = session(vec![target], vec![], 1_000);
        let mut vault = vault(500);
        let mut outbox = Outbox::default();

        let first = send(&mut session, &mut vault, &mut outbox, &invoke(target, 0), 100, NOW).unwrap();
        assert_eq!(first, CommittedSend { entry_index: 0, nonce: 0 });

        let second = send(&mut session, &mut vault, &mut outbox, &invoke(target, 1), 50, NOW + 1).unwrap();
        assert_eq!(second, CommittedSend { entry_index: 1, nonce: 1 });

        assert_eq!(session.nonce, 2);
        assert_eq!(session.fee_spent, 150);
        assert_eq!(vault.balance, 350);
        assert_eq!(vault.total_debited, 150);
        assert_eq!(outbox.entry_count, 2);
        assert_eq!(outbox.last_committed_slot, NOW + 1);
    }

    #[test]
    fn test_replayed_nonce_rejected() {
        let target = Pubkey::new_unique();
        let mut session = session(vec![], vec![], 1_000);
        let mut vault = vault(500);
        let mut outbox = Outbox::default();

        send(&mut session, &mut vault, &mut outbox, &invoke(target, 0), 10, NOW).unwrap();
        let err = send(&mut session, &mut vault, &mut outbox, &invoke(target, 0), 10, NOW).unwrap_err();
        assert_eq!(err, RouterError::InvalidNonce.into());

        let err = send(&mut session, &mut vault, &mut outbox, &invoke(target, 5), 10, NOW).unwrap_err();
        assert_eq!(err, RouterError::InvalidNonce.into());
    }

    #[test]
    fn test_expired_session_rejected_at_boundary() {
        let session = session(vec![], vec![], 1_000);
        let vault = vault(500);
        let message = invoke(Pubkey::new_unique(), 0);

        assert!(authorize_send(&session, &vault, GRID, &message, 1, session.expires_at - 1).is_ok());
        let err = authorize_send(&session, &vault, GRID, &message, 1, session.expires_at).unwrap_err();
        assert_eq!(err, RouterError::SessionExpired.into());
    }

    #[test]
    fn test_grid_mismatch_rejected() {
        let session = session(vec![], vec![], 1_000);
        let vault = vault(500);
        let mut message = invoke(Pubkey::new_unique(), 0);
        message.grid_id = GRID + 1;

        let err = authorize_send(&session, &vault, GRID, &message, 1, NOW).unwrap_err();
        assert_eq!(err, RouterError::InvalidGridId.into());

        let err = authorize_send(&session, &vault, GRID + 1, &message, 1, NOW).unwrap_err();
        assert_eq!(err, RouterError::InvalidGridId.into());
    }

    #[test]
    fn test_program_allowlist() {
        let allowed = Pubkey::new_unique();
        let session = session(vec![allowed], vec![], 1_000);
        let vault = vault(500);

        assert!(authorize_send(&session, &vault, GRID, &invoke(allowed, 0), 1, NOW).is_ok());
        let err = authorize_send(&session, &vault, GRID, &invoke(Pubkey::new_unique(), 0), 1, NOW)
            .unwrap_err();
        assert_eq!(err, RouterError::ProgramNotAllowed.into());

        // Program allowlist does not restrict embedded messages
        assert!(authorize_send(&session, &vault, GRID, &swap(0), 1, NOW).is_ok());
    }

    #[test]
    fn test_opcode_allowlist() {
        let vault = vault(500);

        let open = session(vec![], vec![], 1_000);
        assert!(authorize_send(&open, &vault, GRID, &swap(0), 1, NOW).is_ok());

        let swaps_only = session(vec![], vec![EmbeddedOpcode::Swap.as_u8()], 1_000);
        assert!(authorize_send(&swaps_only, &vault, GRID, &swap(0), 1, NOW).is_ok());

        let mut other_only = swaps_only;
        other_only.allowed_opcodes = vec![0xFF];
        let err = authorize_send(&other_only, &vault, GRID, &swap(0), 1, NOW).unwrap_err();
        assert_eq!(err, RouterError::OpcodeNotAllowed.into());
    }

    #[test]
    fn test_cumulative_fee_cap() {
        let mut session = session(vec![], vec![], 100);
        let mut vault = vault(1_000);
        let mut outbox = Outbox::default();
        let target = Pubkey::new_unique();

        send(&mut session, &mut vault, &mut outbox, &invoke(target, 0), 60, NOW).unwrap();
        let err = send(&mut session, &mut vault, &mut outbox, &invoke(target, 1), 41, NOW).unwrap_err();
        assert_eq!(err, RouterError::FeeCapExceeded.into());

        // Exactly reaching the cap is allowed
        send(&mut session, &mut vault, &mut outbox, &invoke(target, 1), 40, NOW).unwrap();
        assert_eq!(session.remaining_fee_cap(), 0);
    }

    #[test]
    fn test_insufficient_funds() {
        let session = session(vec![], vec![], 1_000);
        let vault = vault(99);
        let err = authorize_send(&session, &vault, GRID, &invoke(Pubkey::new_unique(), 0), 100, NOW)
            .unwrap_err();
        assert_eq!(err, RouterError::InsufficientFunds.into());
    }

    #[test]
    fn test_check_order_expiry_before_nonce_and_funds() {
        let session = session(vec![], vec![], 10);
        let vault = vault(0);
        // Wrong nonce, over cap, no funds, and expired: expiry wins
        let message = invoke(Pubkey::new_unique(), 9);
        let err = authorize_send(&session, &vault, GRID, &message, 1_000, session.expires_at)
            .unwrap_err();
        assert_eq!(err, RouterError::SessionExpired.into());

        // Live: nonce is checked before the cap
        let err = authorize_send(&session, &vault, GRID, &message, 1_000, NOW).unwrap_err();
        assert_eq!(err, RouterError::InvalidNonce.into());
    }

    #[test]
    fn test_zero_fee_budget_allowed() {
        let mut session = session(vec![], vec![], 1);
        let mut vault = vault(0);
        let mut outbox = Outbox::default();
        let committed = send(
            &mut session,
            &mut vault,
            &mut outbox,
            &invoke(Pubkey::new_unique(), 0),
            0,
            NOW,
        )
        .unwrap();
        assert_eq!(committed.nonce, 0);
        assert_eq!(vault.balance, 0);
    }

    #[test]
    fn test_commit_chains_entry_ids() {
        let mut session = session(vec![], vec![], 1_000);
        let mut vault = vault(100);
        let mut outbox = Outbox::default();
        let id = [3u8; 32];

        commit_send(&mut session, &mut vault, &mut outbox, id, 5, NOW).unwrap();
        assert_eq!(outbox.chain_hash, next_chain_hash(&[0u8; 32], &id));
    }
}
