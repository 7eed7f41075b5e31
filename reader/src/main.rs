use std::io::Read;

use anchor_lang::prelude::Rent;
use serde_json::Value;
use sonic_router_reader::config::{require_network, DEFAULT_NETWORK, NETWORKS};
use sonic_router_reader::hssn::{parse_account_json, parse_pubkey, HssnAccountList};
use sonic_router_reader::render;
use sonic_router_reader::{
    decode_entry, decode_fee_vault, decode_outbox, decode_session, derive_addresses,
    verify_outbox, ReaderError,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: sonic-router-reader \
[networks [name]|addresses <owner> <grid_id>|decode <session|fee-vault|outbox|entry>|verify <owner>]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = std::env::args();
    let _bin = args.next();

    let output = match args.next().as_deref() {
        None => return Err(USAGE.to_string()),
        Some("networks") => networks(args.next().as_deref())?,
        Some("addresses") => {
            let owner = required(args.next(), "owner")?;
            let grid_id = required(args.next(), "grid_id")?;
            addresses(&owner, &grid_id)?
        }
        Some("decode") => {
            let kind = required(args.next(), "account kind")?;
            decode(&kind, &read_stdin()?)?
        }
        Some("verify") => {
            let owner = required(args.next(), "owner")?;
            verify(&owner, &read_stdin()?)?
        }
        Some(other) => return Err(format!("unsupported command: {other}. {USAGE}")),
    };

    let rendered = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn required(arg: Option<String>, name: &str) -> Result<String, String> {
    arg.ok_or_else(|| format!("missing {name}. {USAGE}"))
}

fn read_stdin() -> Result<String, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(input)
}

fn networks(name: Option<&str>) -> Result<Value, String> {
    match name {
        Some(name) => {
            let network = require_network(name).map_err(|e| e.to_string())?;
            Ok(render::network_json(network))
        }
        None => Ok(serde_json::json!({
            "default": DEFAULT_NETWORK,
            "networks": NETWORKS.iter().map(render::network_json).collect::<Vec<_>>(),
        })),
    }
}

fn addresses(owner: &str, grid_id: &str) -> Result<Value, String> {
    let owner = parse_pubkey(owner).map_err(|e| e.to_string())?;
    let grid_id = grid_id
        .parse::<u64>()
        .map_err(|e| format!("invalid grid_id {grid_id}: {e}"))?;
    Ok(render::addresses_json(&derive_addresses(&owner, grid_id)))
}

fn decode(kind: &str, input: &str) -> Result<Value, String> {
    let snapshot = parse_account_json(input)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "explorer response contains no account".to_string())?;

    let decoded = match kind {
        "session" => decode_session(&snapshot).map(|a| render::session_json(&a)),
        "fee-vault" => decode_fee_vault(&snapshot).map(|a| render::fee_vault_json(&a)),
        "outbox" => decode_outbox(&snapshot).map(|a| render::outbox_json(&a)),
        "entry" => decode_entry(&snapshot).map(|a| render::entry_json(&a)),
        other => return Err(format!("unknown account kind: {other}. {USAGE}")),
    };
    let account = decoded.map_err(|e| e.to_string())?;

    Ok(serde_json::json!({
        "address": snapshot.address.to_string(),
        "slot": snapshot.slot,
        "account": account,
    }))
}

fn verify(owner: &str, input: &str) -> Result<Value, String> {
    let owner = parse_pubkey(owner).map_err(|e| e.to_string())?;
    let list: HssnAccountList =
        serde_json::from_str(input).map_err(|e| format!("invalid JSON input: {e}"))?;

    let reader = list.into_reader().map_err(|e| e.to_string())?;

    let report = verify_outbox(&reader, &owner, &Rent::default())
        .map_err(|e: ReaderError| e.to_string())?;
    Ok(render::report_json(&report))
}
