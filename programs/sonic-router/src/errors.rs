//! Error codes for the Sonic Router

use anchor_lang::prelude::*;

#[error_code]
pub enum RouterError {
    // Session errors
    #[msg("Too many allowed programs (max 10)")]
    TooManyPrograms,

    #[msg("Too many allowed opcodes (max 10)")]
    TooManyOpcodes,

    #[msg("Unknown embedded opcode")]
    InvalidOpcode,

    #[msg("Session TTL must be greater than zero")]
    InvalidTtl,

    #[msg("Session fee cap must be greater than zero")]
    InvalidFeeCap,

    #[msg("A live session already exists for this grid")]
    SessionAlreadyActive,

    #[msg("Session has expired but has not been closed")]
    SessionPendingClose,

    #[msg("Session has expired")]
    SessionExpired,

    #[msg("Session has not expired yet")]
    SessionNotExpired,

    #[msg("Only the session owner can perform this action")]
    UnauthorizedOwner,

    // Message errors
    #[msg("Message grid does not match the session grid")]
    InvalidGridId,

    #[msg("Target program is not allowed by the session")]
    ProgramNotAllowed,

    #[msg("Opcode is not allowed by the session")]
    OpcodeNotAllowed,

    #[msg("Message nonce does not match the session nonce")]
    InvalidNonce,

    #[msg("Message TTL must be greater than zero")]
    InvalidMessageTtl,

    #[msg("Invoke message references too many accounts")]
    TooManyInvokeAccounts,

    #[msg("Message payload exceeds maximum size")]
    MessageTooLarge,

    #[msg("Embedded operation parameters are invalid")]
    InvalidEmbeddedParams,

    // Fee errors
    #[msg("Deposit amount must be greater than zero")]
    InvalidDepositAmount,

    #[msg("Fee budget exceeds the session's remaining fee cap")]
    FeeCapExceeded,

    #[msg("Insufficient funds in fee vault")]
    InsufficientFunds,

    // Integrity errors
    #[msg("Fee vault ledger does not reconcile with escrowed lamports")]
    VaultBalanceMismatch,

    #[msg("Failed to encode message")]
    MessageEncodingFailed,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}
