//! Grid message types and their wire encoding.
//!
//! A [`GridMessage`] is the unit committed to the outbox. Its borsh encoding is
//! what relayers read back from each outbox entry, so field order is part of
//! the relay format.

use anchor_lang::prelude::*;

/// Embedded operation opcodes executed natively by the grid
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EmbeddedOpcode {
    /// Token swap
    Swap = 0,
}

impl EmbeddedOpcode {
    pub const SIZE: usize = 1;

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EmbeddedOpcode::Swap),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Parameters for an embedded swap
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedParams {
    /// Input token mint
    pub in_mint: Pubkey,
    /// Output token mint
    pub out_mint: Pubkey,
    /// Amount to swap
    pub amount_in: u64,
    /// Slippage tolerance in basis points
    pub slippage_bps: u16,
    /// Deadline slot for execution on the grid
    pub deadline_slot: u64,
    /// Expected execution plan hash (zero = none)
    pub expected_plan_hash: [u8; 32],
}

impl EmbeddedParams {
    pub const SIZE: usize = 32 + // in_mint
        32 + // out_mint
        8 +  // amount_in
        2 +  // slippage_bps
        8 +  // deadline_slot
        32; // expected_plan_hash
}

/// Serializable account metadata for invoke messages
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RelayAccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl RelayAccountMeta {
    pub const SIZE: usize = 32 + 1 + 1;
}

impl From<AccountMeta> for RelayAccountMeta {
    fn from(meta: AccountMeta) -> Self {
        Self {
            pubkey: meta.pubkey,
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        }
    }
}

impl From<RelayAccountMeta> for AccountMeta {
    fn from(meta: RelayAccountMeta) -> Self {
        AccountMeta {
            pubkey: meta.pubkey,
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        }
    }
}

/// Message body
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum GridPayload {
    /// Invoke an arbitrary program on the grid
    Invoke {
        /// Program to invoke on the grid
        target_program: Pubkey,
        /// Accounts required by the call
        accounts: Vec<RelayAccountMeta>,
        /// Instruction data
        data: Vec<u8>,
    },
    /// Run a grid-native embedded operation
    Embedded {
        opcode: EmbeddedOpcode,
        params: EmbeddedParams,
    },
}

/// Message relayed to a grid
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct GridMessage {
    /// Target grid ID
    pub grid_id: u64,
    /// Session nonce this message is authorized under
    pub nonce: u64,
    /// Validity window on the destination grid, in slots
    pub ttl_slots: u64,
    /// Message body
    pub payload: GridPayload,
}

impl GridMessage {
    /// Fixed part of the encoding: grid_id + nonce + ttl_slots + payload tag
    pub const HEADER_SIZE: usize = 8 + 8 + 8 + 1;

    /// Target program for invoke messages.
    pub fn target_program(&self) -> Option<&Pubkey> {
        match &self.payload {
            GridPayload::Invoke { target_program, .. } => Some(target_program),
            GridPayload::Embedded { .. } => None,
        }
    }

    /// Opcode for embedded messages.
    pub fn opcode(&self) -> Option<EmbeddedOpcode> {
        match &self.payload {
            GridPayload::Invoke { .. } => None,
            GridPayload::Embedded { opcode, .. } => Some(*opcode),
        }
    }

    /// Exact borsh-encoded length of this message.
    pub fn serialized_len(&self) -> usize {
        let payload = match &self.payload {
            GridPayload::Invoke { accounts, data, .. } => {
                32 + // target_program
                4 + accounts.len() * RelayAccountMeta::SIZE +
                4 + data.len()
            }
            GridPayload::Embedded { .. } => EmbeddedOpcode::SIZE + EmbeddedParams::SIZE,
        };
        Self::HEADER_SIZE + payload
    }
}
