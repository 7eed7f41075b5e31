//! Lamport transfer between program-owned accounts with checked arithmetic.
//!
//! Used to move relay fees out of the fee vault without a System Program CPI,
//! which is not available for accounts owned by this program.

use crate::errors::RouterError;
use anchor_lang::prelude::*;

/// Transfer `amount` lamports from one account to another using checked arithmetic.
///
/// Returns `Ok(())` immediately if `amount == 0` (no-op).
/// Returns `RouterError::InsufficientFunds` on underflow and
/// `RouterError::ArithmeticOverflow` on overflow.
pub fn transfer_lamports<'info>(
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    **from.try_borrow_mut_lamports()? = from
        .lamports()
        .checked_sub(amount)
        .ok_or(RouterError::InsufficientFunds)?;
    **to.try_borrow_mut_lamports()? = to
        .lamports()
        .checked_add(amount)
        .ok_or(RouterError::ArithmeticOverflow)?;
    Ok(())
}
