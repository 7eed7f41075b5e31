//! HSSN explorer account records.
//!
//! The explorer serves Solana account state mirrored onto the Sonic side as
//! JSON. Only the record format is handled here; fetching it is left to the
//! caller.

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::warn;

use crate::error::ReaderError;
use crate::snapshot::{AccountSnapshot, MemoryReader};

/// One versioned account record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HssnAccountRecord {
    pub address: String,
    /// Owning program
    pub source: String,
    /// Base64 account data
    pub value: String,
    /// Decimal slot
    pub slot: String,
    #[serde(default)]
    pub version: String,
}

/// Response for a single account version
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HssnAccountResponse {
    #[serde(default)]
    pub solana_account: Option<HssnAccountRecord>,
}

/// Response for the account listing, newest first
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HssnAccountList {
    #[serde(default)]
    pub solana_account: Vec<HssnAccountRecord>,
}

impl HssnAccountList {
    /// Load every record into a reader. Where an address is listed more
    /// than once, the record with the highest slot wins.
    pub fn into_reader(self) -> Result<MemoryReader, ReaderError> {
        let mut reader = MemoryReader::new();
        for record in self.solana_account {
            reader.insert_newest(record.into_snapshot()?);
        }
        Ok(reader)
    }
}

pub fn parse_pubkey(value: &str) -> Result<Pubkey, ReaderError> {
    Pubkey::from_str(value).map_err(|_| ReaderError::InvalidPubkey(value.to_string()))
}

impl HssnAccountRecord {
    /// Convert to a snapshot. The explorer does not report lamports.
    pub fn into_snapshot(self) -> Result<AccountSnapshot, ReaderError> {
        let address = parse_pubkey(&self.address)?;
        let owner = parse_pubkey(&self.source)?;
        let data = STANDARD.decode(self.value.as_bytes())?;
        let slot = self.slot.parse::<u64>().unwrap_or_else(|_| {
            warn!(%address, slot = %self.slot, "unparseable record slot, using 0");
            0
        });

        Ok(AccountSnapshot {
            address,
            owner,
            data,
            slot,
            lamports: None,
        })
    }
}

/// Parse either a full explorer response or a bare record.
/// A response without an account yields `Ok(None)`.
pub fn parse_account_json(json: &str) -> Result<Option<AccountSnapshot>, ReaderError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let record = if value.get("solanaAccount").is_some() {
        serde_json::from_value::<HssnAccountResponse>(value)?.solana_account
    } else {
        Some(serde_json::from_value::<HssnAccountRecord>(value)?)
    };
    record.map(HssnAccountRecord::into_snapshot).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::AccountReader;
    use serde_json::json;

    fn record_json(address: &Pubkey, data: &[u8], slot: &str) -> serde_json::Value {
        json!({
            "address": address.to_string(),
            "source": sonic_router::ID.to_string(),
            "value": STANDARD.encode(data),
            "slot": slot,
            "version": "3",
        })
    }

    #[test]
    fn parses_wrapped_response() {
        let address = Pubkey::new_unique();
        let body = json!({ "solanaAccount": record_json(&address, &[1, 2, 3], "42") });
        let snapshot = parse_account_json(&body.to_string()).unwrap().unwrap();

        assert_eq!(snapshot.address, address);
        assert_eq!(snapshot.owner, sonic_router::ID);
        assert_eq!(snapshot.data, vec![1, 2, 3]);
        assert_eq!(snapshot.slot, 42);
        assert_eq!(snapshot.lamports, None);
    }

    #[test]
    fn parses_bare_record() {
        let address = Pubkey::new_unique();
        let body = record_json(&address, &[], "0");
        let snapshot = parse_account_json(&body.to_string()).unwrap().unwrap();
        assert_eq!(snapshot.address, address);
        assert!(snapshot.data.is_empty());
    }

    #[test]
    fn empty_response_is_not_found() {
        assert!(parse_account_json(r#"{"solanaAccount": null}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn bad_slot_falls_back_to_zero() {
        let body = record_json(&Pubkey::new_unique(), &[9], "not-a-slot");
        let snapshot = parse_account_json(&body.to_string()).unwrap().unwrap();
        assert_eq!(snapshot.slot, 0);
    }

    #[test]
    fn bad_base64_is_rejected() {
        let mut body = record_json(&Pubkey::new_unique(), &[], "1");
        body["value"] = json!("***");
        assert!(matches!(
            parse_account_json(&body.to_string()),
            Err(ReaderError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn bad_address_is_rejected() {
        let mut body = record_json(&Pubkey::new_unique(), &[], "1");
        body["address"] = json!("nope");
        assert!(matches!(
            parse_account_json(&body.to_string()),
            Err(ReaderError::InvalidPubkey(_))
        ));
    }

    #[test]
    fn listing_keeps_highest_slot_per_address() {
        let address = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let list: HssnAccountList = serde_json::from_value(json!({
            "solanaAccount": [
                record_json(&address, &[2], "20"),
                record_json(&other, &[5], "5"),
                record_json(&address, &[1], "10"),
            ]
        }))
        .unwrap();

        let reader = list.into_reader().unwrap();
        assert_eq!(reader.len(), 2);
        let snapshot = reader.require(&address).unwrap();
        assert_eq!(snapshot.slot, 20);
        assert_eq!(snapshot.data, vec![2]);
    }

    #[test]
    fn listing_with_bad_record_is_rejected() {
        let mut broken = record_json(&Pubkey::new_unique(), &[], "1");
        broken["value"] = json!("%%%");
        let list: HssnAccountList =
            serde_json::from_value(json!({ "solanaAccount": [broken] })).unwrap();
        assert!(matches!(
            list.into_reader(),
            Err(ReaderError::InvalidEncoding(_))
        ));
    }
}
