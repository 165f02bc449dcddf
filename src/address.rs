//! Address encoding
//!
//! Turns a script destination into the string form users see: Base58Check
//! for key-hash and script-hash destinations, bech32 for witness programs.
//! The encoder is bound to one network's prefixes at construction.

use crate::core::params::NetworkParams;
use crate::crypto::{encode_check, encode_segwit};
use crate::script::{classify, Destination};

/// Encodes destinations for a single network
#[derive(Debug, Clone, Copy)]
pub struct AddressEncoder {
    params: NetworkParams,
}

impl AddressEncoder {
    pub fn new(params: NetworkParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Encode a destination. `None` for destinations with no address form.
    pub fn encode(&self, destination: &Destination) -> Option<String> {
        match destination {
            Destination::None => None,
            Destination::PubKeyHash(hash) => {
                Some(encode_check(self.params.pubkey_hash_version, hash))
            }
            Destination::ScriptHash(hash) => {
                Some(encode_check(self.params.script_hash_version, hash))
            }
            Destination::WitnessV0KeyHash(hash) => self.segwit(0, hash),
            Destination::WitnessV0ScriptHash(hash) => self.segwit(0, hash),
            Destination::WitnessUnknown { version, program } => {
                if !(1..=16).contains(version) || !(2..=40).contains(&program.len()) {
                    return None;
                }
                self.segwit(*version, program)
            }
        }
    }

    /// Classify a locking script and encode its destination.
    pub fn script_address(&self, script: &[u8]) -> Option<String> {
        self.encode(&classify(script).destination())
    }

    fn segwit(&self, version: u8, program: &[u8]) -> Option<String> {
        match encode_segwit(self.params.segwit_prefix, version, program) {
            Ok(address) => Some(address),
            Err(e) => {
                log::debug!("Cannot encode witness v{} program: {}", version, e);
                None
            }
        }
    }
}

impl Default for AddressEncoder {
    fn default() -> Self {
        Self::new(NetworkParams::default())
    }
}
