//! Output script classification
//!
//! Recognises the standard locking-script templates and pulls out the key
//! or hash material an address is built from. Classification is total:
//! anything unrecognised is `NonStandard`, never an error.

use serde::Serialize;
use std::fmt;

use super::opcodes::{decode_small_int, Opcode};
use crate::crypto::keys::{self, COMPRESSED_PUBLIC_KEY_SIZE, PUBLIC_KEY_SIZE};

// =============================================================================
// Template Constants
// =============================================================================

/// Witness v0 key hash program size
pub const WITNESS_V0_KEYHASH_SIZE: usize = 20;

/// Witness v0 script hash program size
pub const WITNESS_V0_SCRIPTHASH_SIZE: usize = 32;

/// OP_HASH160 <20> OP_EQUAL
pub const P2SH_SIZE: usize = 23;

/// OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
pub const P2PKH_SIZE: usize = 25;

/// Push opcode for a 20-byte hash
const PUSH_20: u8 = 0x14;

// =============================================================================
// Classification Results
// =============================================================================

/// Name tag of a recognised template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScriptKind {
    #[serde(rename = "nonstandard")]
    NonStandard,
    #[serde(rename = "pubkey")]
    PubKey,
    #[serde(rename = "pubkeyhash")]
    PubKeyHash,
    #[serde(rename = "scripthash")]
    ScriptHash,
    #[serde(rename = "nulldata")]
    NullData,
    #[serde(rename = "witness_v0_keyhash")]
    WitnessV0KeyHash,
    #[serde(rename = "witness_v0_scripthash")]
    WitnessV0ScriptHash,
    #[serde(rename = "witness_unknown")]
    WitnessUnknown,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 8] = [
        ScriptKind::NonStandard,
        ScriptKind::PubKey,
        ScriptKind::PubKeyHash,
        ScriptKind::ScriptHash,
        ScriptKind::NullData,
        ScriptKind::WitnessV0KeyHash,
        ScriptKind::WitnessV0ScriptHash,
        ScriptKind::WitnessUnknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScriptKind::NonStandard => "nonstandard",
            ScriptKind::PubKey => "pubkey",
            ScriptKind::PubKeyHash => "pubkeyhash",
            ScriptKind::ScriptHash => "scripthash",
            ScriptKind::NullData => "nulldata",
            ScriptKind::WitnessV0KeyHash => "witness_v0_keyhash",
            ScriptKind::WitnessV0ScriptHash => "witness_v0_scripthash",
            ScriptKind::WitnessUnknown => "witness_unknown",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A matched template together with the data it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptPattern {
    /// No recognised template
    NonStandard,
    /// OP_RETURN data carrier, provably unspendable
    NullData,
    /// <pubkey> OP_CHECKSIG
    PubKey(Vec<u8>),
    /// OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
    PubKeyHash([u8; 20]),
    /// OP_HASH160 <20> OP_EQUAL
    ScriptHash([u8; 20]),
    /// OP_0 <20>
    WitnessV0KeyHash([u8; 20]),
    /// OP_0 <32>
    WitnessV0ScriptHash([u8; 32]),
    /// OP_1..OP_16 <2..40>
    WitnessUnknown { version: u8, program: Vec<u8> },
}

/// Where an output's value can be sent, as far as addresses are concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    None,
    PubKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessV0KeyHash([u8; 20]),
    WitnessV0ScriptHash([u8; 32]),
    WitnessUnknown { version: u8, program: Vec<u8> },
}

impl ScriptPattern {
    pub fn kind(&self) -> ScriptKind {
        match self {
            ScriptPattern::NonStandard => ScriptKind::NonStandard,
            ScriptPattern::NullData => ScriptKind::NullData,
            ScriptPattern::PubKey(_) => ScriptKind::PubKey,
            ScriptPattern::PubKeyHash(_) => ScriptKind::PubKeyHash,
            ScriptPattern::ScriptHash(_) => ScriptKind::ScriptHash,
            ScriptPattern::WitnessV0KeyHash(_) => ScriptKind::WitnessV0KeyHash,
            ScriptPattern::WitnessV0ScriptHash(_) => ScriptKind::WitnessV0ScriptHash,
            ScriptPattern::WitnessUnknown { .. } => ScriptKind::WitnessUnknown,
        }
    }

    /// Destination for address encoding. Bare public keys are reported as
    /// the key-hash destination of that key.
    pub fn destination(&self) -> Destination {
        match self {
            ScriptPattern::NonStandard | ScriptPattern::NullData => Destination::None,
            ScriptPattern::PubKey(key) => Destination::PubKeyHash(keys::key_id(key)),
            ScriptPattern::PubKeyHash(hash) => Destination::PubKeyHash(*hash),
            ScriptPattern::ScriptHash(hash) => Destination::ScriptHash(*hash),
            ScriptPattern::WitnessV0KeyHash(hash) => Destination::WitnessV0KeyHash(*hash),
            ScriptPattern::WitnessV0ScriptHash(hash) => Destination::WitnessV0ScriptHash(*hash),
            ScriptPattern::WitnessUnknown { version, program } => Destination::WitnessUnknown {
                version: *version,
                program: program.clone(),
            },
        }
    }
}

// =============================================================================
// Template Matching
// =============================================================================

fn match_script_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == P2SH_SIZE
        && script[0] == Opcode::Hash160.byte()
        && script[1] == PUSH_20
        && script[22] == Opcode::Equal.byte()
    {
        return script[2..22].try_into().ok();
    }
    None
}

/// A witness program is a 1-byte small-integer push followed by a single
/// direct push of 2 to 40 bytes that runs to the end of the script.
fn match_witness_program(script: &[u8]) -> Option<(u8, &[u8])> {
    if script.len() < 4 || script.len() > 42 {
        return None;
    }
    let version = decode_small_int(script[0])?;
    if usize::from(script[1]) + 2 != script.len() {
        return None;
    }
    Some((version, &script[2..]))
}

fn match_pubkey(script: &[u8]) -> Option<&[u8]> {
    for size in [PUBLIC_KEY_SIZE, COMPRESSED_PUBLIC_KEY_SIZE] {
        if script.len() == size + 2
            && usize::from(script[0]) == size
            && script[size + 1] == Opcode::CheckSig.byte()
        {
            let key = &script[1..size + 1];
            return keys::is_valid_encoding(key).then_some(key);
        }
    }
    None
}

fn match_pubkey_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() == P2PKH_SIZE
        && script[0] == Opcode::Dup.byte()
        && script[1] == Opcode::Hash160.byte()
        && script[2] == PUSH_20
        && script[23] == Opcode::EqualVerify.byte()
        && script[24] == Opcode::CheckSig.byte()
    {
        return script[3..23].try_into().ok();
    }
    None
}

fn classify_witness(version: u8, program: &[u8]) -> ScriptPattern {
    if version != 0 {
        return ScriptPattern::WitnessUnknown {
            version,
            program: program.to_vec(),
        };
    }
    match program.len() {
        WITNESS_V0_KEYHASH_SIZE => <[u8; 20]>::try_from(program)
            .map(ScriptPattern::WitnessV0KeyHash)
            .unwrap_or(ScriptPattern::NonStandard),
        WITNESS_V0_SCRIPTHASH_SIZE => <[u8; 32]>::try_from(program)
            .map(ScriptPattern::WitnessV0ScriptHash)
            .unwrap_or(ScriptPattern::NonStandard),
        _ => ScriptPattern::NonStandard,
    }
}

/// Classify a locking script. First match wins, in this order: script
/// hash, witness program, null data, public key, public key hash.
pub fn classify(script: &[u8]) -> ScriptPattern {
    if let Some(hash) = match_script_hash(script) {
        return ScriptPattern::ScriptHash(hash);
    }

    if let Some((version, program)) = match_witness_program(script) {
        return classify_witness(version, program);
    }

    if script.first() == Some(&Opcode::Return.byte()) {
        return ScriptPattern::NullData;
    }

    if let Some(key) = match_pubkey(script) {
        return ScriptPattern::PubKey(key.to_vec());
    }

    if let Some(hash) = match_pubkey_hash(script) {
        return ScriptPattern::PubKeyHash(hash);
    }

    ScriptPattern::NonStandard
}
