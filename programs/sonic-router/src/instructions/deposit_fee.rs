//! Deposit lamports into the owner's fee vault

use crate::errors::RouterError;
use crate::events::FeeDeposited;
use crate::state::{FeeVault, FEE_VAULT_SEED};
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct DepositFee<'info> {
    #[account(
        init_if_needed,
        payer = owner,
        space = FeeVault::SIZE,
        seeds = [FEE_VAULT_SEED, owner.key().as_ref()],
        bump
    )]
    pub fee_vault: Account<'info, FeeVault>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<DepositFee>, amount: u64) -> Result<()> {
    require!(amount > 0, RouterError::InvalidDepositAmount);

    let clock = Clock::get()?;
    let owner = ctx.accounts.owner.key();
    let vault = &mut ctx.accounts.fee_vault;

    // Initialize on first use
    let vault_created = !vault.is_initialized();
    if vault_created {
        vault.owner = owner;
        vault.bump = ctx.bumps.fee_vault;
    }

    anchor_lang::system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            anchor_lang::system_program::Transfer {
                from: ctx.accounts.owner.to_account_info(),
                to: vault.to_account_info(),
            },
        ),
        amount,
    )?;

    vault.credit(amount)?;

    let rent_exempt_minimum = Rent::get()?.minimum_balance(FeeVault::SIZE);
    vault.reconcile(vault.to_account_info().lamports(), rent_exempt_minimum)?;

    emit!(FeeDeposited {
        fee_vault: vault.key(),
        owner,
        amount,
        balance: vault.balance,
        vault_created,
        slot: clock.slot,
    });

    Ok(())
}
