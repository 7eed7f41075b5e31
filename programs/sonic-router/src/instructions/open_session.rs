//! Open a session authorizing relays to one grid

use crate::events::SessionOpened;
use crate::state::{Session, SESSION_SEED};
use anchor_lang::prelude::*;

#[derive(Accounts)]
#[instruction(grid_id: u64)]
pub struct OpenSession<'info> {
    #[account(
        init_if_needed,
        payer = owner,
        space = Session::SIZE,
        seeds = [SESSION_SEED, owner.key().as_ref(), &grid_id.to_le_bytes()],
        bump
    )]
    pub session: Account<'info, Session>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// An existing session must be closed before the key is reused, whether it is
/// still live or already expired.
pub fn handler(
    ctx: Context<OpenSession>,
    grid_id: u64,
    allowed_programs: Vec<Pubkey>,
    allowed_opcodes: Vec<u8>,
    ttl_slots: u64,
    fee_cap: u64,
) -> Result<()> {
    let clock = Clock::get()?;
    let owner = ctx.accounts.owner.key();
    let session = &mut ctx.accounts.session;

    session.ensure_vacant(clock.slot)?;

    let opened = Session::new(
        owner,
        grid_id,
        allowed_programs,
        allowed_opcodes,
        ttl_slots,
        fee_cap,
        clock.slot,
        ctx.bumps.session,
    )?;
    session.set_inner(opened);

    emit!(SessionOpened {
        session: session.key(),
        owner,
        grid_id,
        allowed_programs: session.allowed_programs.len() as u8,
        allowed_opcodes: session.allowed_opcodes.len() as u8,
        ttl_slots,
        fee_cap,
        expires_at: session.expires_at,
        slot: clock.slot,
    });

    msg!(
        "Session opened for grid {} until slot {}",
        grid_id,
        session.expires_at
    );

    Ok(())
}
