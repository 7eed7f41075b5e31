//! Account snapshots and the `fetch` capability.

use std::collections::HashMap;

use anchor_lang::prelude::Pubkey;

use crate::error::ReaderError;

/// Raw account contents as seen by some source at some slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub address: Pubkey,
    /// Program that owns the account
    pub owner: Pubkey,
    pub data: Vec<u8>,
    pub slot: u64,
    /// Not every source reports lamports
    pub lamports: Option<u64>,
}

/// Anything that can look up an account by address.
pub trait AccountReader {
    /// `Ok(None)` means the account does not exist.
    fn fetch(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, ReaderError>;

    /// Like `fetch`, but a missing account is an error.
    fn require(&self, address: &Pubkey) -> Result<AccountSnapshot, ReaderError> {
        self.fetch(address)?
            .ok_or(ReaderError::AccountNotFound(*address))
    }
}

/// In-memory account store.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    accounts: HashMap<Pubkey, AccountSnapshot>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot at its address.
    pub fn insert(&mut self, snapshot: AccountSnapshot) {
        self.accounts.insert(snapshot.address, snapshot);
    }

    /// Insert unless a snapshot from a later slot is already held.
    pub fn insert_newest(&mut self, snapshot: AccountSnapshot) {
        match self.accounts.get(&snapshot.address) {
            Some(held) if held.slot > snapshot.slot => {}
            _ => self.insert(snapshot),
        }
    }

    pub fn remove(&mut self, address: &Pubkey) -> Option<AccountSnapshot> {
        self.accounts.remove(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountReader for MemoryReader {
    fn fetch(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, ReaderError> {
        Ok(self.accounts.get(address).cloned())
    }
}
