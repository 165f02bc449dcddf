//! Network parameters
//!
//! The three supported networks differ only in the record marker that
//! frames blocks on disk and in the prefixes their addresses carry.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selectable network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

/// Immutable per-network constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Four bytes preceding every record in a block file
    pub marker: [u8; 4],
    /// Base58 version byte for key-hash addresses
    pub pubkey_hash_version: u8,
    /// Base58 version byte for script-hash addresses
    pub script_hash_version: u8,
    /// Bech32 human-readable part for witness addresses
    pub segwit_prefix: &'static str,
}

const MAINNET: NetworkParams = NetworkParams {
    marker: [0xf9, 0xbe, 0xb4, 0xd9],
    pubkey_hash_version: 0,
    script_hash_version: 5,
    segwit_prefix: "bc",
};

const TESTNET: NetworkParams = NetworkParams {
    marker: [0x0b, 0x11, 0x09, 0x07],
    pubkey_hash_version: 111,
    script_hash_version: 196,
    segwit_prefix: "tb",
};

const REGTEST: NetworkParams = NetworkParams {
    marker: [0xfa, 0xbf, 0xb5, 0xda],
    pubkey_hash_version: 111,
    script_hash_version: 196,
    segwit_prefix: "bcrt",
};

impl Network {
    pub fn params(self) -> NetworkParams {
        match self {
            Network::Mainnet => MAINNET,
            Network::Testnet => TESTNET,
            Network::Regtest => REGTEST,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Network::default().params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_params() {
        let params = Network::Mainnet.params();
        assert_eq!(params.marker, [0xf9, 0xbe, 0xb4, 0xd9]);
        assert_eq!(params.pubkey_hash_version, 0);
        assert_eq!(params.script_hash_version, 5);
        assert_eq!(params.segwit_prefix, "bc");
        assert_eq!(NetworkParams::default(), params);
    }

    #[test]
    fn test_test_networks_share_versions() {
        let testnet = Network::Testnet.params();
        let regtest = Network::Regtest.params();
        assert_eq!(testnet.pubkey_hash_version, regtest.pubkey_hash_version);
        assert_eq!(testnet.script_hash_version, regtest.script_hash_version);
        assert_ne!(testnet.marker, regtest.marker);
        assert_eq!(regtest.segwit_prefix, "bcrt");
    }

    #[test]
    fn test_network_names() {
        assert_eq!(Network::Testnet.to_string(), "testnet");
        assert_eq!(
            serde_json::to_string(&Network::Regtest).unwrap(),
            "\"regtest\""
        );
    }
}
