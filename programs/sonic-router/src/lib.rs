#![allow(unexpected_cfgs)]
//! Sonic Router
//!
//! Authorization and outbound-queue half of a Solana to Sonic Grid bridge.
//! Owners open time-boxed, fee-capped sessions per grid, fund a fee vault,
//! and commit messages to an append-only outbox that relayers drain.

use anchor_lang::prelude::*;

declare_id!("J6YB6HFjFecHKRvgfWwqa6sAr2DhR2k7ArvAd6NG7mBo");

pub mod errors;
pub mod events;
pub mod instructions;
pub mod message;
pub mod state;
pub mod utils;

use instructions::*;
use message::GridMessage;

#[program]
pub mod sonic_router {
    use super::*;

    /// Open a session granting the signer permission to relay messages to a grid.
    /// Creates a unique PDA keyed by (owner, grid_id).
    ///
    /// # Arguments
    /// * `ctx` - Context containing the session account and owner
    /// * `grid_id` - Target grid identifier
    /// * `allowed_programs` - Target programs the session may invoke (empty = any, max 10)
    /// * `allowed_opcodes` - Embedded opcode bytes the session may use (empty = any, max 10)
    /// * `ttl_slots` - Number of slots the session stays valid
    /// * `fee_cap` - Cumulative fee ceiling for the session in lamports
    pub fn open_session(
        ctx: Context<OpenSession>,
        grid_id: u64,
        allowed_programs: Vec<Pubkey>,
        allowed_opcodes: Vec<u8>,
        ttl_slots: u64,
        fee_cap: u64,
    ) -> Result<()> {
        instructions::open_session::handler(
            ctx,
            grid_id,
            allowed_programs,
            allowed_opcodes,
            ttl_slots,
            fee_cap,
        )
    }

    /// Deposit lamports into the owner's fee vault.
    /// The vault is created on first deposit and funds every grid session.
    pub fn deposit_fee(ctx: Context<DepositFee>, amount: u64) -> Result<()> {
        instructions::deposit_fee::handler(ctx, amount)
    }

    /// Commit a message to the owner's outbox for relay to the grid.
    /// Validates the session, debits the fee vault, appends the entry
    /// (creating the outbox on first use) and advances the session nonce.
    ///
    /// # Arguments
    /// * `grid_id` - Grid of the session authorizing this message
    /// * `message` - Message to relay; `message.nonce` must equal the session nonce
    /// * `fee_budget` - Lamports debited from the fee vault for this entry
    pub fn send_message(
        ctx: Context<SendMessage>,
        grid_id: u64,
        message: GridMessage,
        fee_budget: u64,
    ) -> Result<()> {
        instructions::send_message::handler(ctx, grid_id, message, fee_budget)
    }

    /// Close an expired session and reclaim its rent.
    /// Can only be called once the session's `expires_at` slot has been reached.
    pub fn close_expired(ctx: Context<CloseExpired>, grid_id: u64) -> Result<()> {
        instructions::close_expired::handler(ctx, grid_id)
    }
}
