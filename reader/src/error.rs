//! Errors surfaced by the reader.

use anchor_lang::prelude::Pubkey;
use thiserror::Error;

use crate::config::ConfigError;
use crate::verify::Violation;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("account {address} is owned by {owner}, not the router program")]
    WrongOwner { address: Pubkey, owner: Pubkey },

    #[error("account {address} is not a {expected} account")]
    WrongAccountType {
        address: Pubkey,
        expected: &'static str,
    },

    #[error("failed to decode {kind} account {address}: {reason}")]
    Decode {
        address: Pubkey,
        kind: &'static str,
        reason: String,
    },

    #[error("invalid public key {0:?}")]
    InvalidPubkey(String),

    #[error("invalid account data encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("invalid account record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("invariant violated: {0}")]
    Violation(#[from] Violation),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
