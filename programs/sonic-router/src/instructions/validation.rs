//! Shared validation helpers for instruction handlers

use crate::errors::RouterError;
use crate::message::{GridMessage, GridPayload};
use anchor_lang::prelude::*;

use super::constants::{BASIS_POINTS_DIVISOR, MAX_INVOKE_ACCOUNTS, MAX_INVOKE_DATA_LEN};

/// Validates the shape of a message before it is committed.
///
/// - `ttl_slots` must be non-zero
/// - Invoke messages reference at most 32 accounts and 1024 bytes of data
/// - Embedded swaps need a non-zero amount and slippage within 100%
pub fn validate_message(message: &GridMessage) -> Result<()> {
    require!(message.ttl_slots > 0, RouterError::InvalidMessageTtl);

    match &message.payload {
        GridPayload::Invoke { accounts, data, .. } => {
            require!(
                accounts.len() <= MAX_INVOKE_ACCOUNTS,
                RouterError::TooManyInvokeAccounts
            );
            require!(
                data.len() <= MAX_INVOKE_DATA_LEN,
                RouterError::MessageTooLarge
            );
        }
        GridPayload::Embedded { params, .. } => {
            require!(params.amount_in > 0, RouterError::InvalidEmbeddedParams);
            require!(
                params.slippage_bps <= BASIS_POINTS_DIVISOR,
                RouterError::InvalidEmbeddedParams
            );
        }
    }

    Ok(())
}
