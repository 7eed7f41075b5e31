//! Account state structures for the Sonic Router

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use crate::errors::RouterError;
use crate::message::{EmbeddedOpcode, GridMessage};

// ============================================================================
// PDA Namespaces
// ============================================================================

/// Session PDA seed prefix. Seeds: ["session", owner, grid_id (u64 LE)]
pub const SESSION_SEED: &[u8] = b"session";

/// Fee vault PDA seed prefix. Seeds: ["fee_vault", owner]
pub const FEE_VAULT_SEED: &[u8] = b"fee_vault";

/// Outbox PDA seed prefix. Seeds: ["outbox", owner]
pub const OUTBOX_SEED: &[u8] = b"outbox";

/// Outbox entry PDA seed prefix. Seeds: ["outbox_entry", outbox, index (u64 LE)]
pub const OUTBOX_ENTRY_SEED: &[u8] = b"outbox_entry";

/// Size of SHA-256 digests used for entry ids and the outbox chain
pub const HASH_SIZE: usize = 32;

// ============================================================================
// Session
// ============================================================================

/// Capability grant for relaying messages to one grid.
/// PDA seeds: ["session", owner, grid_id]
///
/// Lifecycle: created by `open_session`, advanced by `send_message`
/// (nonce and fee_spent only), closed by `close_expired` once
/// `expires_at` has been reached.
#[account]
#[derive(Default, InitSpace, Debug)]
pub struct Session {
    /// Owner of this session
    pub owner: Pubkey,
    /// Target grid ID
    pub grid_id: u64,
    /// Programs that may be invoked (empty = unrestricted)
    #[max_len(10)]
    pub allowed_programs: Vec<Pubkey>,
    /// Embedded opcode bytes that may be used (empty = unrestricted)
    #[max_len(10)]
    pub allowed_opcodes: Vec<u8>,
    /// Cumulative fee ceiling in lamports
    pub fee_cap: u64,
    /// Fees committed so far under this session
    pub fee_spent: u64,
    /// Time-to-live in slots
    pub ttl_slots: u64,
    /// Creation slot
    pub created_at: u64,
    /// First slot at which the session is expired (created_at + ttl_slots)
    pub expires_at: u64,
    /// Replay-protection counter; equals the number of messages sent
    pub nonce: u64,
    /// Bump seed
    pub bump: u8,
}

impl Session {
    pub const MAX_ALLOWED_PROGRAMS: usize = 10;
    pub const MAX_ALLOWED_OPCODES: usize = 10;

    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        8 +  // grid_id
        4 + (32 * Self::MAX_ALLOWED_PROGRAMS) + // allowed_programs
        4 + (EmbeddedOpcode::SIZE * Self::MAX_ALLOWED_OPCODES) + // allowed_opcodes
        8 +  // fee_cap
        8 +  // fee_spent
        8 +  // ttl_slots
        8 +  // created_at
        8 +  // expires_at
        8 +  // nonce
        1; // bump

    /// Build a fresh session with `nonce = 0`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: Pubkey,
        grid_id: u64,
        allowed_programs: Vec<Pubkey>,
        allowed_opcodes: Vec<u8>,
        ttl_slots: u64,
        fee_cap: u64,
        current_slot: u64,
        bump: u8,
    ) -> Result<Self> {
        require!(
            allowed_programs.len() <= Self::MAX_ALLOWED_PROGRAMS,
            RouterError::TooManyPrograms
        );
        require!(
            allowed_opcodes.len() <= Self::MAX_ALLOWED_OPCODES,
            RouterError::TooManyOpcodes
        );
        require!(
            allowed_opcodes
                .iter()
                .all(|&op| EmbeddedOpcode::from_u8(op).is_some()),
            RouterError::InvalidOpcode
        );
        require!(ttl_slots > 0, RouterError::InvalidTtl);
        require!(fee_cap > 0, RouterError::InvalidFeeCap);

        let expires_at = current_slot
            .checked_add(ttl_slots)
            .ok_or(RouterError::ArithmeticOverflow)?;

        Ok(Self {
            owner,
            grid_id,
            allowed_programs,
            allowed_opcodes,
            fee_cap,
            fee_spent: 0,
            ttl_slots,
            created_at: current_slot,
            expires_at,
            nonce: 0,
            bump,
        })
    }

    /// A zeroed account (fresh from `init_if_needed`) has no owner.
    pub fn is_initialized(&self) -> bool {
        self.owner != Pubkey::default()
    }

    /// Fails if a session already occupies this key, live or awaiting close.
    pub fn ensure_vacant(&self, current_slot: u64) -> Result<()> {
        if !self.is_initialized() {
            return Ok(());
        }
        if self.is_expired(current_slot) {
            return Err(RouterError::SessionPendingClose.into());
        }
        Err(RouterError::SessionAlreadyActive.into())
    }

    /// Check if session is expired
    pub fn is_expired(&self, current_slot: u64) -> bool {
        current_slot >= self.expires_at
    }

    /// Check if program is allowed
    pub fn is_program_allowed(&self, program: &Pubkey) -> bool {
        self.allowed_programs.is_empty() || self.allowed_programs.contains(program)
    }

    /// Check if opcode is allowed
    pub fn is_opcode_allowed(&self, opcode: EmbeddedOpcode) -> bool {
        self.allowed_opcodes.is_empty() || self.allowed_opcodes.contains(&opcode.as_u8())
    }

    /// Fee headroom left under the cap
    pub fn remaining_fee_cap(&self) -> u64 {
        self.fee_cap.saturating_sub(self.fee_spent)
    }

    /// Consume the current nonce and charge `fee_budget` against the cap.
    /// Returns the nonce that was consumed.
    pub fn advance(&mut self, fee_budget: u64) -> Result<u64> {
        let fee_spent = self
            .fee_spent
            .checked_add(fee_budget)
            .ok_or(RouterError::ArithmeticOverflow)?;
        require!(fee_spent <= self.fee_cap, RouterError::FeeCapExceeded);

        let consumed = self.nonce;
        self.nonce = self
            .nonce
            .checked_add(1)
            .ok_or(RouterError::ArithmeticOverflow)?;
        self.fee_spent = fee_spent;
        Ok(consumed)
    }

    /// Sessions can only be closed at or past `expires_at`.
    pub fn ensure_closable(&self, current_slot: u64) -> Result<()> {
        require!(
            self.is_expired(current_slot),
            RouterError::SessionNotExpired
        );
        Ok(())
    }
}

// ============================================================================
// Fee Vault
// ============================================================================

/// Per-owner escrow funding relay fees across all grids.
/// PDA seeds: ["fee_vault", owner]
///
/// The account's lamports always cover `rent_exempt_minimum + balance`.
#[account]
#[derive(Default, InitSpace, Debug)]
pub struct FeeVault {
    /// Vault owner
    pub owner: Pubkey,
    /// Tracked spendable balance in lamports
    pub balance: u64,
    /// Lifetime deposits
    pub total_deposited: u64,
    /// Lifetime debits by `send_message`
    pub total_debited: u64,
    /// Bump seed
    pub bump: u8,
}

impl FeeVault {
    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        8 +  // balance
        8 +  // total_deposited
        8 +  // total_debited
        1; // bump

    pub fn is_initialized(&self) -> bool {
        self.owner != Pubkey::default()
    }

    pub fn has_sufficient_balance(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Record a deposit
    pub fn credit(&mut self, amount: u64) -> Result<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        self.total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Record a fee debit
    pub fn debit(&mut self, amount: u64) -> Result<()> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(RouterError::InsufficientFunds)?;
        self.total_debited = self
            .total_debited
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Verify the ledger against the account's actual lamports.
    pub fn reconcile(&self, lamports: u64, rent_exempt_minimum: u64) -> Result<()> {
        let ledger = self
            .total_deposited
            .checked_sub(self.total_debited)
            .ok_or(RouterError::VaultBalanceMismatch)?;
        require!(ledger == self.balance, RouterError::VaultBalanceMismatch);

        let required = rent_exempt_minimum
            .checked_add(self.balance)
            .ok_or(RouterError::ArithmeticOverflow)?;
        require!(lamports >= required, RouterError::VaultBalanceMismatch);
        Ok(())
    }
}

// ============================================================================
// Outbox
// ============================================================================

/// Append-only log of committed messages awaiting relay.
/// PDA seeds: ["outbox", owner]
///
/// Created lazily by the owner's first `send_message`. Entries live in their
/// own PDAs addressed by index; `chain_hash` commits to all of them in order.
#[account]
#[derive(Default, InitSpace, Debug)]
pub struct Outbox {
    /// Owner whose sessions feed this outbox
    pub authority: Pubkey,
    /// Number of entries ever appended
    pub entry_count: u64,
    /// Rolling hash over entry ids: chain' = sha256(chain || entry_id)
    pub chain_hash: [u8; 32],
    /// Slot of the most recent append
    pub last_committed_slot: u64,
    /// Bump seed
    pub bump: u8,
}

impl Outbox {
    pub const SIZE: usize = 8 + // discriminator
        32 + // authority
        8 +  // entry_count
        32 + // chain_hash
        8 +  // last_committed_slot
        1; // bump

    pub fn is_initialized(&self) -> bool {
        self.authority != Pubkey::default()
    }

    /// Append an entry id, returning the index it was stored at.
    pub fn append(&mut self, entry_id: [u8; HASH_SIZE], current_slot: u64) -> Result<u64> {
        let index = self.entry_count;
        self.entry_count = self
            .entry_count
            .checked_add(1)
            .ok_or(RouterError::ArithmeticOverflow)?;
        self.chain_hash = next_chain_hash(&self.chain_hash, &entry_id);
        self.last_committed_slot = current_slot;
        Ok(index)
    }
}

/// Fold an entry id into the outbox chain.
pub fn next_chain_hash(chain: &[u8; HASH_SIZE], entry_id: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    hashv(&[chain.as_ref(), entry_id.as_ref()]).to_bytes()
}

// ============================================================================
// Outbox Entry
// ============================================================================

/// One committed message. Never modified after creation.
/// PDA seeds: ["outbox_entry", outbox, index]
///
/// Holds the relay fee debited from the fee vault on top of its rent.
#[account]
#[derive(Debug)]
pub struct OutboxEntry {
    /// Outbox this entry belongs to
    pub outbox: Pubkey,
    /// Owner that committed the entry
    pub authority: Pubkey,
    /// Session that authorized the entry
    pub session: Pubkey,
    /// Position in the outbox
    pub index: u64,
    /// Fee debited for this entry
    pub fee_budget: u64,
    /// Commit slot
    pub committed_slot: u64,
    /// Entry id (see [`OutboxEntry::compute_id`])
    pub entry_id: [u8; 32],
    /// Bump seed
    pub bump: u8,
    /// The relayed message
    pub message: GridMessage,
}

impl OutboxEntry {
    pub const FIXED_SIZE: usize = 8 + // discriminator
        32 + // outbox
        32 + // authority
        32 + // session
        8 +  // index
        8 +  // fee_budget
        8 +  // committed_slot
        32 + // entry_id
        1; // bump

    /// Account space needed to store `message`
    pub fn space_for(message: &GridMessage) -> usize {
        Self::FIXED_SIZE + message.serialized_len()
    }

    /// Entry id: sha256(authority || session || index || fee_budget || message)
    pub fn compute_id(
        authority: &Pubkey,
        session: &Pubkey,
        index: u64,
        fee_budget: u64,
        message: &GridMessage,
    ) -> Result<[u8; HASH_SIZE]> {
        let mut encoded = Vec::with_capacity(message.serialized_len());
        message
            .serialize(&mut encoded)
            .map_err(|_| error!(RouterError::MessageEncodingFailed))?;
        Ok(hashv(&[
            authority.as_ref(),
            session.as_ref(),
            &index.to_le_bytes(),
            &fee_budget.to_le_bytes(),
            &encoded,
        ])
        .to_bytes())
    }

    /// Recompute this entry's id from its stored fields.
    pub fn expected_id(&self) -> Result<[u8; HASH_SIZE]> {
        Self::compute_id(
            &self.authority,
            &self.session,
            self.index,
            self.fee_budget,
            &self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::GridPayload;

    /// Helper: SIZE should equal INIT_SPACE (borsh serialized) + 8-byte discriminator.
    macro_rules! test_size_constant {
        ($struct:ty) => {
            assert_eq!(
                <$struct>::SIZE,
                <$struct as anchor_lang::Space>::INIT_SPACE + 8,
                concat!(stringify!($struct), "::SIZE mismatch with INIT_SPACE")
            );
        };
    }

    fn open(programs: usize, ttl_slots: u64, created_at: u64) -> Result<Session> {
        Session::new(
            Pubkey::new_unique(),
            1,
            (0..programs).map(|_| Pubkey::new_unique()).collect(),
            vec![],
            ttl_slots,
            1_000_000,
            created_at,
            255,
        )
    }

    #[test]
    fn test_session_size() {
        test_size_constant!(Session);
    }

    #[test]
    fn test_fee_vault_size() {
        test_size_constant!(FeeVault);
    }

    #[test]
    fn test_outbox_size() {
        test_size_constant!(Outbox);
    }

    #[test]
    fn test_session_allows_ten_programs() {
        let session = open(10, 2000, 0).unwrap();
        assert_eq!(session.allowed_programs.len(), 10);
        assert_eq!(session.nonce, 0);
    }

    #[test]
    fn test_session_rejects_eleven_programs() {
        assert_eq!(
            open(11, 2000, 0).unwrap_err(),
            RouterError::TooManyPrograms.into()
        );
    }

    #[test]
    fn test_session_rejects_unknown_opcode() {
        let err = Session::new(Pubkey::new_unique(), 1, vec![], vec![0, 9], 10, 10, 0, 0)
            .unwrap_err();
        assert_eq!(err, RouterError::InvalidOpcode.into());
    }

    #[test]
    fn test_session_rejects_too_many_opcodes() {
        let err = Session::new(Pubkey::new_unique(), 1, vec![], vec![0; 11], 10, 10, 0, 0)
            .unwrap_err();
        assert_eq!(err, RouterError::TooManyOpcodes.into());
    }

    #[test]
    fn test_session_rejects_zero_ttl_and_cap() {
        let owner = Pubkey::new_unique();
        assert_eq!(
            Session::new(owner, 1, vec![], vec![], 0, 10, 0, 0).unwrap_err(),
            RouterError::InvalidTtl.into()
        );
        assert_eq!(
            Session::new(owner, 1, vec![], vec![], 10, 0, 0, 0).unwrap_err(),
            RouterError::InvalidFeeCap.into()
        );
    }

    #[test]
    fn test_session_expiry_overflow() {
        assert_eq!(
            open(0, u64::MAX, 1).unwrap_err(),
            RouterError::ArithmeticOverflow.into()
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let session = open(0, 2000, 100).unwrap();
        assert_eq!(session.expires_at, 2100);
        assert!(!session.is_expired(2099));
        assert!(session.is_expired(2100));
        assert!(session.ensure_closable(2099).is_err());
        assert!(session.ensure_closable(2100).is_ok());
    }

    #[test]
    fn test_ensure_vacant() {
        assert!(Session::default().ensure_vacant(0).is_ok());

        let session = open(0, 10, 0).unwrap();
        assert_eq!(
            session.ensure_vacant(9).unwrap_err(),
            RouterError::SessionAlreadyActive.into()
        );
        assert_eq!(
            session.ensure_vacant(10).unwrap_err(),
            RouterError::SessionPendingClose.into()
        );
    }

    #[test]
    fn test_empty_allowlists_are_unrestricted() {
        let session = open(0, 10, 0).unwrap();
        assert!(session.is_program_allowed(&Pubkey::new_unique()));
        assert!(session.is_opcode_allowed(EmbeddedOpcode::Swap));
    }

    #[test]
    fn test_advance_consumes_sequential_nonces() {
        let mut session = open(0, 10, 0).unwrap();
        for expected in 0..5u64 {
            assert_eq!(session.advance(100).unwrap(), expected);
        }
        assert_eq!(session.nonce, 5);
        assert_eq!(session.fee_spent, 500);
        assert_eq!(session.remaining_fee_cap(), 1_000_000 - 500);
    }

    #[test]
    fn test_advance_respects_cumulative_cap() {
        let mut session = open(0, 10, 0).unwrap();
        session.advance(999_999).unwrap();
        let before = session.nonce;
        assert_eq!(
            session.advance(2).unwrap_err(),
            RouterError::FeeCapExceeded.into()
        );
        assert_eq!(session.nonce, before);
        assert_eq!(session.fee_spent, 999_999);
    }

    #[test]
    fn test_fee_vault_ledger() {
        let mut vault = FeeVault::default();
        vault.credit(500_000).unwrap();
        vault.debit(100_000).unwrap();
        assert_eq!(vault.balance, 400_000);
        assert_eq!(vault.total_deposited, 500_000);
        assert_eq!(vault.total_debited, 100_000);
        assert!(vault.has_sufficient_balance(400_000));
        assert!(!vault.has_sufficient_balance(400_001));
    }

    #[test]
    fn test_fee_vault_debit_underflow() {
        let mut vault = FeeVault::default();
        vault.credit(10).unwrap();
        assert_eq!(
            vault.debit(11).unwrap_err(),
            RouterError::InsufficientFunds.into()
        );
        assert_eq!(vault.balance, 10);
    }

    #[test]
    fn test_fee_vault_reconcile() {
        let mut vault = FeeVault::default();
        vault.credit(1_000).unwrap();
        assert!(vault.reconcile(2_000, 1_000).is_ok());
        assert!(vault.reconcile(5_000, 1_000).is_ok());
        assert_eq!(
            vault.reconcile(1_999, 1_000).unwrap_err(),
            RouterError::VaultBalanceMismatch.into()
        );

        vault.balance = 999;
        assert_eq!(
            vault.reconcile(5_000, 1_000).unwrap_err(),
            RouterError::VaultBalanceMismatch.into()
        );
    }

    #[test]
    fn test_outbox_append_chains_entries() {
        let mut outbox = Outbox::default();
        let a = [1u8; 32];
        let b = [2u8; 32];

        assert_eq!(outbox.append(a, 5).unwrap(), 0);
        assert_eq!(outbox.append(b, 6).unwrap(), 1);
        assert_eq!(outbox.entry_count, 2);
        assert_eq!(outbox.last_committed_slot, 6);

        let expected = next_chain_hash(&next_chain_hash(&[0u8; 32], &a), &b);
        assert_eq!(outbox.chain_hash, expected);
    }

    #[test]
    fn test_chain_hash_is_order_sensitive() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let ab = next_chain_hash(&next_chain_hash(&[0u8; 32], &a), &b);
        let ba = next_chain_hash(&next_chain_hash(&[0u8; 32], &b), &a);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_chain_hash_is_sha256_of_concatenation() {
        // sha256 of 64 zero bytes
        let expected: [u8; 32] = [
            0xf5, 0xa5, 0xfd, 0x42, 0xd1, 0x6a, 0x20, 0x30, 0x27, 0x98, 0xef, 0x6e, 0xd3, 0x09,
            0x97, 0x9b, 0x43, 0x00, 0x3d, 0x23, 0x20, 0xd9, 0xf0, 0xe8, 0xea, 0x98, 0x31, 0xa9,
            0x27, 0x59, 0xfb, 0x4b,
        ];
        assert_eq!(next_chain_hash(&[0u8; 32], &[0u8; 32]), expected);
    }

    #[test]
    fn test_entry_space_matches_encoding() {
        let message = GridMessage {
            grid_id: 1,
            nonce: 0,
            ttl_slots: 1000,
            payload: GridPayload::Invoke {
                target_program: Pubkey::new_unique(),
                accounts: vec![],
                data: vec![1, 2, 3],
            },
        };
        let entry = OutboxEntry {
            outbox: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            session: Pubkey::new_unique(),
            index: 0,
            fee_budget: 100_000,
            committed_slot: 10,
            entry_id: [0u8; 32],
            bump: 254,
            message: message.clone(),
        };
        let mut encoded = Vec::new();
        entry.serialize(&mut encoded).unwrap();
        assert_eq!(OutboxEntry::space_for(&message), encoded.len() + 8);
    }

    #[test]
    fn test_entry_id_binds_every_field() {
        let authority = Pubkey::new_unique();
        let session = Pubkey::new_unique();
        let message = GridMessage {
            grid_id: 1,
            nonce: 0,
            ttl_slots: 1000,
            payload: GridPayload::Invoke {
                target_program: Pubkey::new_unique(),
                accounts: vec![],
                data: vec![],
            },
        };
        let base = OutboxEntry::compute_id(&authority, &session, 0, 100, &message).unwrap();

        assert_eq!(
            base,
            OutboxEntry::compute_id(&authority, &session, 0, 100, &message).unwrap()
        );
        assert_ne!(
            base,
            OutboxEntry::compute_id(&authority, &session, 1, 100, &message).unwrap()
        );
        assert_ne!(
            base,
            OutboxEntry::compute_id(&authority, &session, 0, 101, &message).unwrap()
        );
        let mut bumped = message.clone();
        bumped.nonce = 1;
        assert_ne!(
            base,
            OutboxEntry::compute_id(&authority, &session, 0, 100, &bumped).unwrap()
        );
    }
}
