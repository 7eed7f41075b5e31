//! Arbitrary input generators for fuzz testing
//!
//! Generates random inputs for router instructions, biased towards the
//! boundaries the router enforces (allowlist sizes, message limits, fee caps,
//! expiry slots).

use anchor_lang::prelude::Pubkey;
use proptest::prelude::*;
use sonic_router::instructions::constants::{MAX_INVOKE_ACCOUNTS, MAX_INVOKE_DATA_LEN};
use sonic_router::message::{
    EmbeddedOpcode, EmbeddedParams, GridMessage, GridPayload, RelayAccountMeta,
};
use sonic_router::state::Session;

/// Arbitrary 32-byte identifier
pub fn arb_id() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

/// Arbitrary public key
pub fn arb_pubkey() -> impl Strategy<Value = Pubkey> {
    arb_id().prop_map(Pubkey::new_from_array)
}

/// Arbitrary grid id; a handful of fixed grids make collisions likely
pub fn arb_grid_id() -> impl Strategy<Value = u64> {
    prop_oneof![
        3 => 0u64..4u64,
        1 => Just(u64::MAX),
        1 => any::<u64>(),
    ]
}

/// Arbitrary slot with edge cases
pub fn arb_slot() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        Just(u64::MAX - 1),
        1_000u64..1_000_000_000u64,
    ]
}

/// Arbitrary session TTL in slots
pub fn arb_ttl_slots() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        1u64..10_000u64,
    ]
}

/// Arbitrary lamport amount with edge cases
pub fn arb_lamports() -> impl Strategy<Value = u64> {
    prop_oneof![
        // Edge cases
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        Just(u64::MAX / 2),
        // Small amounts
        1u64..10_000u64,
        // Typical amounts
        10_000u64..1_000_000_000u64,
    ]
}

/// Arbitrary program allowlist, sometimes one longer than allowed
pub fn arb_allowed_programs() -> impl Strategy<Value = Vec<Pubkey>> {
    prop::collection::vec(arb_pubkey(), 0..=Session::MAX_ALLOWED_PROGRAMS + 1)
}

/// Arbitrary opcode allowlist, mostly known opcodes
pub fn arb_allowed_opcodes() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        4 => Just(Vec::new()),
        4 => Just(vec![EmbeddedOpcode::Swap.as_u8()]),
        1 => prop::collection::vec(any::<u8>(), 0..=Session::MAX_ALLOWED_OPCODES + 1),
    ]
}

/// Arbitrary invoke account count around the limit
pub fn arb_account_count() -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(0usize),
        Just(MAX_INVOKE_ACCOUNTS),
        Just(MAX_INVOKE_ACCOUNTS + 1),
        0usize..MAX_INVOKE_ACCOUNTS,
    ]
}

/// Arbitrary invoke data length around the limit
pub fn arb_data_len() -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(0usize),
        Just(MAX_INVOKE_DATA_LEN),
        Just(MAX_INVOKE_DATA_LEN + 1),
        0usize..256usize,
    ]
}

/// Arbitrary slippage tolerance (valid range is 0-10000 bps)
pub fn arb_slippage_bps() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(0u16),
        Just(10000u16),
        Just(10001u16),
        Just(u16::MAX),
        1u16..1000u16,
    ]
}

/// Offset applied to the session nonce; mostly the correct nonce
pub fn arb_nonce_offset() -> impl Strategy<Value = i8> {
    prop_oneof![
        6 => Just(0i8),
        1 => -2i8..=2i8,
    ]
}

/// Message shape, bound to a session's grid and nonce at simulation time
#[derive(Debug, Clone)]
pub struct MessageInput {
    pub embedded: bool,
    /// Index into the session's allowed programs; out of range picks `stray_program`
    pub target_index: u8,
    pub stray_program: Pubkey,
    pub account_count: usize,
    pub data_len: usize,
    pub amount_in: u64,
    pub slippage_bps: u16,
    pub ttl_slots: u64,
    pub nonce_offset: i8,
    /// Send under a different grid than the session's
    pub wrong_grid: bool,
}

impl MessageInput {
    /// Build the concrete message for `session`.
    pub fn build(&self, session: &Session) -> GridMessage {
        let nonce = if self.nonce_offset >= 0 {
            session.nonce.wrapping_add(self.nonce_offset as u64)
        } else {
            session.nonce.wrapping_sub(self.nonce_offset.unsigned_abs() as u64)
        };
        let grid_id = if self.wrong_grid {
            session.grid_id.wrapping_add(1)
        } else {
            session.grid_id
        };

        let payload = if self.embedded {
            GridPayload::Embedded {
                opcode: EmbeddedOpcode::Swap,
                params: EmbeddedParams {
                    in_mint: self.stray_program,
                    out_mint: Pubkey::default(),
                    amount_in: self.amount_in,
                    slippage_bps: self.slippage_bps,
                    deadline_slot: session.expires_at,
                    expected_plan_hash: [0u8; 32],
                },
            }
        } else {
            let target_program = session
                .allowed_programs
                .get(self.target_index as usize)
                .copied()
                .unwrap_or(self.stray_program);
            GridPayload::Invoke {
                target_program,
                accounts: (0..self.account_count)
                    .map(|i| RelayAccountMeta {
                        pubkey: Pubkey::new_from_array([i as u8; 32]),
                        is_signer: false,
                        is_writable: i % 2 == 0,
                    })
                    .collect(),
                data: vec![0xAB; self.data_len],
            }
        };

        GridMessage {
            grid_id,
            nonce,
            ttl_slots: self.ttl_slots,
            payload,
        }
    }
}

impl Arbitrary for MessageInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<bool>(),
            0u8..12u8,
            arb_pubkey(),
            arb_account_count(),
            arb_data_len(),
            prop_oneof![Just(0u64), 1u64..u64::MAX],
            arb_slippage_bps(),
            prop_oneof![9 => 1u64..1_000u64, 1 => Just(0u64)],
            arb_nonce_offset(),
            prop::bool::weighted(0.05),
        )
            .prop_map(
                |(embedded, target_index, stray_program, account_count, data_len, amount_in,
                  slippage_bps, ttl_slots, nonce_offset, wrong_grid)| {
                    MessageInput {
                        embedded,
                        target_index,
                        stray_program,
                        account_count,
                        data_len,
                        amount_in,
                        slippage_bps,
                        ttl_slots,
                        nonce_offset,
                        wrong_grid,
                    }
                },
            )
            .boxed()
    }
}

/// Input for open_session fuzz testing
#[derive(Debug, Clone)]
pub struct OpenSessionInput {
    pub owner: Pubkey,
    pub grid_id: u64,
    pub allowed_programs: Vec<Pubkey>,
    pub allowed_opcodes: Vec<u8>,
    pub ttl_slots: u64,
    pub fee_cap: u64,
    pub current_slot: u64,
}

impl Arbitrary for OpenSessionInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            arb_pubkey(),
            arb_grid_id(),
            arb_allowed_programs(),
            arb_allowed_opcodes(),
            arb_ttl_slots(),
            arb_lamports(),
            arb_slot(),
        )
            .prop_map(
                |(owner, grid_id, allowed_programs, allowed_opcodes, ttl_slots, fee_cap,
                  current_slot)| {
                    OpenSessionInput {
                        owner,
                        grid_id,
                        allowed_programs,
                        allowed_opcodes,
                        ttl_slots,
                        fee_cap,
                        current_slot,
                    }
                },
            )
            .boxed()
    }
}

/// Input for send_message fuzz testing
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub owner: Pubkey,
    pub grid_id: u64,
    pub allowed_programs: Vec<Pubkey>,
    pub fee_cap: u64,
    pub deposit: u64,
    pub fee_budget: u64,
    /// Slots elapsed between opening the session and sending
    pub elapsed_slots: u64,
    pub message: MessageInput,
}

impl Arbitrary for SendMessageInput {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            arb_pubkey(),
            arb_grid_id(),
            prop::collection::vec(arb_pubkey(), 0..=Session::MAX_ALLOWED_PROGRAMS),
            1u64..1_000_000u64,
            prop_oneof![Just(0u64), 1u64..2_000_000u64],
            prop_oneof![Just(0u64), 1u64..1_500_000u64],
            prop_oneof![4 => 0u64..100u64, 1 => 100u64..200u64],
            any::<MessageInput>(),
        )
            .prop_map(
                |(owner, grid_id, allowed_programs, fee_cap, deposit, fee_budget, elapsed_slots,
                  message)| {
                    SendMessageInput {
                        owner,
                        grid_id,
                        allowed_programs,
                        fee_cap,
                        deposit,
                        fee_budget,
                        elapsed_slots,
                        message,
                    }
                },
            )
            .boxed()
    }
}

/// One step of a session lifecycle sequence
#[derive(Debug, Clone)]
pub enum LifecycleOp {
    Open {
        grid_id: u64,
        ttl_slots: u64,
        fee_cap: u64,
        restrict_programs: bool,
    },
    Deposit {
        amount: u64,
    },
    Send {
        grid_id: u64,
        fee_budget: u64,
        message: MessageInput,
    },
    AdvanceSlots {
        slots: u64,
    },
    Close {
        grid_id: u64,
    },
}

/// Arbitrary lifecycle step over a small set of grids
pub fn arb_lifecycle_op() -> impl Strategy<Value = LifecycleOp> {
    prop_oneof![
        2 => (0u64..3u64, 1u64..200u64, 1u64..50_000u64, any::<bool>()).prop_map(
            |(grid_id, ttl_slots, fee_cap, restrict_programs)| LifecycleOp::Open {
                grid_id,
                ttl_slots,
                fee_cap,
                restrict_programs,
            }
        ),
        2 => prop_oneof![Just(0u64), 1u64..20_000u64]
            .prop_map(|amount| LifecycleOp::Deposit { amount }),
        5 => (0u64..3u64, 0u64..5_000u64, any::<MessageInput>()).prop_map(
            |(grid_id, fee_budget, message)| LifecycleOp::Send {
                grid_id,
                fee_budget,
                message,
            }
        ),
        1 => (1u64..150u64).prop_map(|slots| LifecycleOp::AdvanceSlots { slots }),
        1 => (0u64..3u64).prop_map(|grid_id| LifecycleOp::Close { grid_id }),
    ]
}

/// Sequence of lifecycle steps for one owner
#[derive(Debug, Clone)]
pub struct SessionLifecycleSequence {
    pub owner: Pubkey,
    pub start_slot: u64,
    pub ops: Vec<LifecycleOp>,
}

impl Arbitrary for SessionLifecycleSequence {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            arb_pubkey(),
            0u64..1_000_000u64,
            prop::collection::vec(arb_lifecycle_op(), 1..40),
        )
            .prop_map(|(owner, start_slot, ops)| SessionLifecycleSequence {
                owner,
                start_slot,
                ops,
            })
            .boxed()
    }
}
