//! Close an expired session and return its rent to the owner

use crate::errors::RouterError;
use crate::events::SessionClosed;
use crate::state::{Session, SESSION_SEED};
use anchor_lang::prelude::*;

#[derive(Accounts)]
#[instruction(grid_id: u64)]
pub struct CloseExpired<'info> {
    #[account(
        mut,
        close = owner,
        seeds = [SESSION_SEED, owner.key().as_ref(), &grid_id.to_le_bytes()],
        bump = session.bump,
        has_one = owner @ RouterError::UnauthorizedOwner
    )]
    pub session: Account<'info, Session>,

    #[account(mut)]
    pub owner: Signer<'info>,
}

pub fn handler(ctx: Context<CloseExpired>, grid_id: u64) -> Result<()> {
    let clock = Clock::get()?;
    let session = &ctx.accounts.session;

    session.ensure_closable(clock.slot)?;

    emit!(SessionClosed {
        session: session.key(),
        owner: session.owner,
        grid_id,
        messages_sent: session.nonce,
        fee_spent: session.fee_spent,
        reclaimed_lamports: session.to_account_info().lamports(),
        slot: clock.slot,
    });

    Ok(())
}
