//! JSON views of router accounts for command-line output.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use sonic_router::message::{GridMessage, GridPayload};
use sonic_router::state::{FeeVault, Outbox, OutboxEntry, Session};

use crate::config::NetworkConfig;
use crate::verify::OutboxReport;
use crate::RouterAddresses;

pub fn addresses_json(addresses: &RouterAddresses) -> Value {
    json!({
        "owner": addresses.owner.to_string(),
        "grid_id": addresses.grid_id,
        "session": addresses.session.to_string(),
        "fee_vault": addresses.fee_vault.to_string(),
        "outbox": addresses.outbox.to_string(),
        "program_id": sonic_router::ID.to_string(),
    })
}

pub fn network_json(network: &NetworkConfig) -> Value {
    json!({
        "name": network.name,
        "solana_rpc": network.solana_rpc,
        "sonic_grid": network.sonic_grid,
        "sonic_rpc": network.sonic_rpc,
        "hssn_exapi": network.hssn_exapi,
        "nisaba_oracle": network.nisaba_oracle,
    })
}

pub fn session_json(session: &Session) -> Value {
    json!({
        "owner": session.owner.to_string(),
        "grid_id": session.grid_id,
        "allowed_programs": session
            .allowed_programs
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>(),
        "allowed_opcodes": session.allowed_opcodes,
        "fee_cap": session.fee_cap,
        "fee_spent": session.fee_spent,
        "ttl_slots": session.ttl_slots,
        "created_at": session.created_at,
        "expires_at": session.expires_at,
        "nonce": session.nonce,
    })
}

pub fn fee_vault_json(vault: &FeeVault) -> Value {
    json!({
        "owner": vault.owner.to_string(),
        "balance": vault.balance,
        "total_deposited": vault.total_deposited,
        "total_debited": vault.total_debited,
    })
}

pub fn outbox_json(outbox: &Outbox) -> Value {
    json!({
        "authority": outbox.authority.to_string(),
        "entry_count": outbox.entry_count,
        "chain_hash": hex::encode(outbox.chain_hash),
        "last_committed_slot": outbox.last_committed_slot,
    })
}

pub fn message_json(message: &GridMessage) -> Value {
    let payload = match &message.payload {
        GridPayload::Invoke {
            target_program,
            accounts,
            data,
        } => json!({
            "kind": "invoke",
            "target_program": target_program.to_string(),
            "accounts": accounts
                .iter()
                .map(|meta| json!({
                    "pubkey": meta.pubkey.to_string(),
                    "is_signer": meta.is_signer,
                    "is_writable": meta.is_writable,
                }))
                .collect::<Vec<_>>(),
            "data": STANDARD.encode(data),
        }),
        GridPayload::Embedded { opcode, params } => json!({
            "kind": "embedded",
            "opcode": opcode.as_u8(),
            "in_mint": params.in_mint.to_string(),
            "out_mint": params.out_mint.to_string(),
            "amount_in": params.amount_in,
            "slippage_bps": params.slippage_bps,
            "deadline_slot": params.deadline_slot,
            "expected_plan_hash": hex::encode(params.expected_plan_hash),
        }),
    };
    json!({
        "grid_id": message.grid_id,
        "nonce": message.nonce,
        "ttl_slots": message.ttl_slots,
        "payload": payload,
    })
}

pub fn entry_json(entry: &OutboxEntry) -> Value {
    json!({
        "outbox": entry.outbox.to_string(),
        "authority": entry.authority.to_string(),
        "session": entry.session.to_string(),
        "index": entry.index,
        "fee_budget": entry.fee_budget,
        "committed_slot": entry.committed_slot,
        "entry_id": hex::encode(entry.entry_id),
        "message": message_json(&entry.message),
    })
}

pub fn report_json(report: &OutboxReport) -> Value {
    json!({
        "outbox": report.address.to_string(),
        "entry_count": report.entry_count,
        "chain_hash": hex::encode(report.chain_hash),
        "last_committed_slot": report.last_committed_slot,
        "total_escrowed": report.total_escrowed,
        "entries": report
            .entries
            .iter()
            .map(|entry| json!({
                "address": entry.address.to_string(),
                "index": entry.account.index,
                "fee_budget": entry.account.fee_budget,
                "entry_id": hex::encode(entry.account.entry_id),
            }))
            .collect::<Vec<_>>(),
    })
}
