//! Typed decoding of router accounts from snapshots.

use anchor_lang::prelude::Pubkey;
use anchor_lang::{AccountDeserialize, Discriminator};
use sonic_router::state::{FeeVault, Outbox, OutboxEntry, Session};
use sonic_router::utils::pda::{
    fee_vault_address, outbox_address, outbox_entry_address, session_address,
};
use tracing::debug;

use crate::error::ReaderError;
use crate::snapshot::{AccountReader, AccountSnapshot};

/// A decoded account with the snapshot metadata it came from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub address: Pubkey,
    pub account: T,
    pub slot: u64,
    pub lamports: Option<u64>,
}

/// Decode a router account, checking program ownership and the account
/// discriminator first.
pub fn decode_account<T>(snapshot: &AccountSnapshot, kind: &'static str) -> Result<T, ReaderError>
where
    T: AccountDeserialize + Discriminator,
{
    if snapshot.owner != sonic_router::ID {
        return Err(ReaderError::WrongOwner {
            address: snapshot.address,
            owner: snapshot.owner,
        });
    }
    if !snapshot.data.starts_with(T::DISCRIMINATOR) {
        return Err(ReaderError::WrongAccountType {
            address: snapshot.address,
            expected: kind,
        });
    }
    let mut data = snapshot.data.as_slice();
    T::try_deserialize(&mut data).map_err(|err| ReaderError::Decode {
        address: snapshot.address,
        kind,
        reason: err.to_string(),
    })
}

pub fn decode_session(snapshot: &AccountSnapshot) -> Result<Session, ReaderError> {
    decode_account(snapshot, "session")
}

pub fn decode_fee_vault(snapshot: &AccountSnapshot) -> Result<FeeVault, ReaderError> {
    decode_account(snapshot, "fee vault")
}

pub fn decode_outbox(snapshot: &AccountSnapshot) -> Result<Outbox, ReaderError> {
    decode_account(snapshot, "outbox")
}

pub fn decode_entry(snapshot: &AccountSnapshot) -> Result<OutboxEntry, ReaderError> {
    decode_account(snapshot, "outbox entry")
}

fn load<T, R>(
    reader: &R,
    address: Pubkey,
    decode: fn(&AccountSnapshot) -> Result<T, ReaderError>,
) -> Result<Option<Loaded<T>>, ReaderError>
where
    R: AccountReader + ?Sized,
{
    let Some(snapshot) = reader.fetch(&address)? else {
        debug!(%address, "account not found");
        return Ok(None);
    };
    let account = decode(&snapshot)?;
    Ok(Some(Loaded {
        address,
        account,
        slot: snapshot.slot,
        lamports: snapshot.lamports,
    }))
}

pub fn load_session<R>(
    reader: &R,
    owner: &Pubkey,
    grid_id: u64,
) -> Result<Option<Loaded<Session>>, ReaderError>
where
    R: AccountReader + ?Sized,
{
    load(reader, session_address(owner, grid_id).0, decode_session)
}

pub fn load_fee_vault<R>(reader: &R, owner: &Pubkey) -> Result<Option<Loaded<FeeVault>>, ReaderError>
where
    R: AccountReader + ?Sized,
{
    load(reader, fee_vault_address(owner).0, decode_fee_vault)
}

/// Load an owner's outbox. An outbox that was never created reads as empty.
pub fn load_outbox<R>(reader: &R, owner: &Pubkey) -> Result<Loaded<Outbox>, ReaderError>
where
    R: AccountReader + ?Sized,
{
    let address = outbox_address(owner).0;
    Ok(load(reader, address, decode_outbox)?.unwrap_or(Loaded {
        address,
        account: Outbox::default(),
        slot: 0,
        lamports: None,
    }))
}

/// Load the entry at `index`. Entries below `entry_count` must exist.
pub fn load_entry<R>(
    reader: &R,
    outbox: &Pubkey,
    index: u64,
) -> Result<Loaded<OutboxEntry>, ReaderError>
where
    R: AccountReader + ?Sized,
{
    let address = outbox_entry_address(outbox, index).0;
    load(reader, address, decode_entry)?.ok_or(ReaderError::AccountNotFound(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemoryReader;
    use crate::testing::{snapshot_of, RouterFixture};

    #[test]
    fn decodes_session_written_by_program() {
        let fixture = RouterFixture::new();
        let reader = fixture.reader();
        let loaded = load_session(&reader, &fixture.owner, fixture.grid_id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.account.owner, fixture.owner);
        assert_eq!(loaded.account.grid_id, fixture.grid_id);
        assert_eq!(loaded.account.nonce, fixture.entries.len() as u64);
    }

    #[test]
    fn missing_session_is_none() {
        let fixture = RouterFixture::new();
        let reader = fixture.reader();
        assert!(load_session(&reader, &fixture.owner, fixture.grid_id + 1)
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_outbox_reads_as_empty() {
        let reader = MemoryReader::new();
        let owner = Pubkey::new_unique();
        let outbox = load_outbox(&reader, &owner).unwrap();
        assert_eq!(outbox.address, outbox_address(&owner).0);
        assert_eq!(outbox.account.entry_count, 0);
        assert_eq!(outbox.account.chain_hash, [0u8; 32]);
    }

    #[test]
    fn missing_entry_is_not_found() {
        let reader = MemoryReader::new();
        let outbox = Pubkey::new_unique();
        assert!(matches!(
            load_entry(&reader, &outbox, 0),
            Err(ReaderError::AccountNotFound(_))
        ));
    }

    #[test]
    fn rejects_foreign_owner() {
        let fixture = RouterFixture::new();
        let mut snapshot = snapshot_of(fixture.session_address(), &fixture.session, Some(1));
        snapshot.owner = Pubkey::new_unique();
        assert!(matches!(
            decode_session(&snapshot),
            Err(ReaderError::WrongOwner { .. })
        ));
    }

    #[test]
    fn rejects_wrong_account_type() {
        let fixture = RouterFixture::new();
        let snapshot = snapshot_of(fixture.session_address(), &fixture.session, Some(1));
        assert!(matches!(
            decode_fee_vault(&snapshot),
            Err(ReaderError::WrongAccountType { expected: "fee vault", .. })
        ));
    }

    #[test]
    fn rejects_truncated_data() {
        let fixture = RouterFixture::new();
        let mut snapshot = snapshot_of(fixture.session_address(), &fixture.session, Some(1));
        snapshot.data.truncate(20);
        assert!(matches!(
            decode_session(&snapshot),
            Err(ReaderError::Decode { kind: "session", .. })
        ));
    }
}
