//! Fixtures built from real program state, serialized the way the program
//! writes accounts.

use anchor_lang::prelude::{Pubkey, Rent};
use anchor_lang::AccountSerialize;
use sonic_router::instructions::commit_send;
use sonic_router::message::{GridMessage, GridPayload};
use sonic_router::state::{FeeVault, Outbox, OutboxEntry, Session};
use sonic_router::utils::pda::{
    fee_vault_address, outbox_address, outbox_entry_address, session_address,
};

use crate::snapshot::{AccountSnapshot, MemoryReader};

pub const FIXTURE_SLOT: u64 = 500;

pub fn snapshot_of<T: AccountSerialize>(
    address: Pubkey,
    account: &T,
    lamports: Option<u64>,
) -> AccountSnapshot {
    let mut data = Vec::new();
    account.try_serialize(&mut data).unwrap();
    AccountSnapshot {
        address,
        owner: sonic_router::ID,
        data,
        slot: FIXTURE_SLOT,
        lamports,
    }
}

/// One owner with a session, a funded vault and a few committed entries
pub struct RouterFixture {
    pub owner: Pubkey,
    pub grid_id: u64,
    pub rent: Rent,
    pub session: Session,
    pub fee_vault: FeeVault,
    pub outbox: Outbox,
    pub entries: Vec<OutboxEntry>,
}

impl RouterFixture {
    pub fn new() -> Self {
        Self::with_fees(&[100, 0, 250])
    }

    pub fn with_fees(fees: &[u64]) -> Self {
        let owner = Pubkey::new_unique();
        let grid_id = 5;
        let (session_key, session_bump) = session_address(&owner, grid_id);
        let (outbox_key, outbox_bump) = outbox_address(&owner);

        let mut session = Session::new(
            owner,
            grid_id,
            vec![],
            vec![],
            1_000,
            10_000,
            FIXTURE_SLOT - 10,
            session_bump,
        )
        .unwrap();
        let mut fee_vault = FeeVault {
            owner,
            bump: fee_vault_address(&owner).1,
            ..FeeVault::default()
        };
        fee_vault.credit(5_000).unwrap();
        let mut outbox = Outbox {
            authority: owner,
            bump: outbox_bump,
            ..Outbox::default()
        };

        let mut entries = Vec::new();
        for (i, fee_budget) in fees.iter().enumerate() {
            let message = GridMessage {
                grid_id,
                nonce: session.nonce,
                ttl_slots: 20,
                payload: GridPayload::Invoke {
                    target_program: Pubkey::new_unique(),
                    accounts: vec![],
                    data: vec![i as u8; i + 1],
                },
            };
            let index = outbox.entry_count;
            let entry_id =
                OutboxEntry::compute_id(&owner, &session_key, index, *fee_budget, &message)
                    .unwrap();
            commit_send(
                &mut session,
                &mut fee_vault,
                &mut outbox,
                entry_id,
                *fee_budget,
                FIXTURE_SLOT,
            )
            .unwrap();
            entries.push(OutboxEntry {
                outbox: outbox_key,
                authority: owner,
                session: session_key,
                index,
                fee_budget: *fee_budget,
                committed_slot: FIXTURE_SLOT,
                entry_id,
                bump: outbox_entry_address(&outbox_key, index).1,
                message,
            });
        }

        Self {
            owner,
            grid_id,
            rent: Rent::default(),
            session,
            fee_vault,
            outbox,
            entries,
        }
    }

    pub fn session_address(&self) -> Pubkey {
        session_address(&self.owner, self.grid_id).0
    }

    pub fn outbox_address(&self) -> Pubkey {
        outbox_address(&self.owner).0
    }

    pub fn vault_rent(&self) -> u64 {
        self.rent.minimum_balance(FeeVault::SIZE)
    }

    pub fn entry_snapshot(&self, entry: &OutboxEntry) -> AccountSnapshot {
        let rent = self.rent.minimum_balance(OutboxEntry::space_for(&entry.message));
        snapshot_of(
            outbox_entry_address(&self.outbox_address(), entry.index).0,
            entry,
            Some(rent + entry.fee_budget),
        )
    }

    pub fn reader(&self) -> MemoryReader {
        let mut reader = MemoryReader::new();
        reader.insert(snapshot_of(
            self.session_address(),
            &self.session,
            Some(self.rent.minimum_balance(Session::SIZE)),
        ));
        reader.insert(snapshot_of(
            fee_vault_address(&self.owner).0,
            &self.fee_vault,
            Some(self.vault_rent() + self.fee_vault.balance),
        ));
        reader.insert(snapshot_of(
            self.outbox_address(),
            &self.outbox,
            Some(self.rent.minimum_balance(Outbox::SIZE)),
        ));
        for entry in &self.entries {
            reader.insert(self.entry_snapshot(entry));
        }
        reader
    }
}
