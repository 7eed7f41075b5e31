#![forbid(unsafe_code)]

use thiserror::Error;

pub const DEFAULT_NETWORK: &str = "testnet";

pub const SONIC_GRID_ENDPOINT: &str = "https://api-dev.hypergrid.dev";
pub const SONIC_RPC_ENDPOINT: &str = "https://api.testnet.sonic.game";
pub const HSSN_EXAPI_ENDPOINT: &str = "https://exapi-hssn.testnet.sonic.game";
pub const NISABA_ORACLE_ENDPOINT: &str = "https://testnet.nisaba-hssn.sonic.game";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub solana_rpc: &'static str,
    pub sonic_grid: &'static str,
    pub sonic_rpc: &'static str,
    pub hssn_exapi: &'static str,
    pub nisaba_oracle: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

// Sonic endpoints are shared; only the Solana side differs per network
pub const NETWORKS: [NetworkConfig; 3] = [
    NetworkConfig {
        name: "mainnet",
        solana_rpc: "https://api.mainnet-beta.solana.com",
        sonic_grid: SONIC_GRID_ENDPOINT,
        sonic_rpc: SONIC_RPC_ENDPOINT,
        hssn_exapi: HSSN_EXAPI_ENDPOINT,
        nisaba_oracle: NISABA_ORACLE_ENDPOINT,
    },
    NetworkConfig {
        name: DEFAULT_NETWORK,
        solana_rpc: "https://api.testnet.solana.com",
        sonic_grid: SONIC_GRID_ENDPOINT,
        sonic_rpc: SONIC_RPC_ENDPOINT,
        hssn_exapi: HSSN_EXAPI_ENDPOINT,
        nisaba_oracle: NISABA_ORACLE_ENDPOINT,
    },
    NetworkConfig {
        name: "devnet",
        solana_rpc: "https://api.devnet.solana.com",
        sonic_grid: SONIC_GRID_ENDPOINT,
        sonic_rpc: SONIC_RPC_ENDPOINT,
        hssn_exapi: HSSN_EXAPI_ENDPOINT,
        nisaba_oracle: NISABA_ORACLE_ENDPOINT,
    },
];

pub fn require_network(name: &str) -> Result<&'static NetworkConfig, ConfigError> {
    NETWORKS
        .iter()
        .find(|network| network.name == name)
        .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_networks_resolve() {
        for name in ["mainnet", "testnet", "devnet"] {
            assert_eq!(require_network(name).unwrap().name, name);
        }
        assert_eq!(
            require_network(DEFAULT_NETWORK).unwrap().solana_rpc,
            "https://api.testnet.solana.com"
        );
    }

    #[test]
    fn unknown_network_is_rejected() {
        assert_eq!(
            require_network("mainnet-beta"),
            Err(ConfigError::UnknownNetwork("mainnet-beta".to_string()))
        );
    }

    #[test]
    fn network_names_are_unique() {
        for (i, a) in NETWORKS.iter().enumerate() {
            for b in &NETWORKS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
