//! Transaction records
//!
//! Wire layout, legacy form:
//! `version || inputs || outputs || lock_time`
//!
//! Witness form inserts an empty input list (the marker `0x00`) and a
//! flag byte after the version, and the witness stacks before the lock
//! time:
//! `version || 0x00 || flags || inputs || outputs || witnesses || lock_time`
//!
//! A legacy decoder reads the marker as "no inputs", which is what keeps
//! the two forms distinguishable.

use crate::address::AddressEncoder;
use crate::codec::{
    read_compact_size, read_var_bytes, write_compact_size, write_var_bytes, Decodable,
    DecodeError, Encodable,
};
use crate::crypto::double_sha256;
use crate::script::{Script, ScriptPattern};
use crate::stream::BufferedSource;
use bitflags::bitflags;
use std::io::Read;

// =============================================================================
// Constants
// =============================================================================

/// Sequence number that disables lock time for an input
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Output index carried by a null outpoint
pub const NULL_INDEX: u32 = u32::MAX;

bitflags! {
    /// Optional-data flags following the witness marker
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxFlags: u8 {
        /// Witness stacks follow the outputs
        const WITNESS = 0x01;
    }
}

// =============================================================================
// Outpoint
// =============================================================================

/// Reference to an output of an earlier transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction id, internal byte order
    pub hash: [u8; 32],
    pub index: u32,
}

impl OutPoint {
    pub fn null() -> Self {
        Self {
            hash: [0u8; 32],
            index: NULL_INDEX,
        }
    }

    /// True for the placeholder spent by coinbase inputs
    pub fn is_null(&self) -> bool {
        self.index == NULL_INDEX && self.hash == [0u8; 32]
    }
}

impl Decodable for OutPoint {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            hash: <[u8; 32]>::decode(src)?,
            index: u32::decode(src)?,
        })
    }
}

impl Encodable for OutPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hash.encode(out);
        self.index.encode(out);
    }
}

// =============================================================================
// Witness
// =============================================================================

/// Per-input witness stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness(Vec<Vec<u8>>);

impl Witness {
    pub fn new(items: Vec<Vec<u8>>) -> Self {
        Self(items)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decodable for Witness {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        let count = read_compact_size(src)? as usize;
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(read_var_bytes(src)?);
        }
        Ok(Self(items))
    }
}

impl Encodable for Witness {
    fn encode(&self, out: &mut Vec<u8>) {
        write_compact_size(self.0.len() as u64, out);
        for item in &self.0 {
            write_var_bytes(item, out);
        }
    }
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Transaction input
///
/// The witness is not part of the input's own encoding; the enclosing
/// transaction reads and writes it in its own section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
    pub witness: Witness,
}

impl Decodable for TxIn {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            previous_output: OutPoint::decode(src)?,
            script_sig: Script::decode(src)?,
            sequence: u32::decode(src)?,
            witness: Witness::default(),
        })
    }
}

impl Encodable for TxIn {
    fn encode(&self, out: &mut Vec<u8>) {
        self.previous_output.encode(out);
        self.script_sig.encode(out);
        self.sequence.encode(out);
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in base units
    pub value: u64,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn pattern(&self) -> ScriptPattern {
        self.script_pubkey.pattern()
    }

    /// Address paying to this output, if its script has one
    pub fn address(&self, encoder: &AddressEncoder) -> Option<String> {
        encoder.encode(&self.pattern().destination())
    }
}

impl Decodable for TxOut {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            value: u64::decode(src)?,
            script_pubkey: Script::decode(src)?,
        })
    }
}

impl Encodable for TxOut {
    fn encode(&self, out: &mut Vec<u8>) {
        self.value.encode(out);
        self.script_pubkey.encode(out);
    }
}

// =============================================================================
// Transaction
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// True if any input carries a non-empty witness stack
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Single input spending the null outpoint
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }

    /// Hash of the witness-stripped encoding, internal byte order
    pub fn txid(&self) -> [u8; 32] {
        let mut out = Vec::new();
        self.encode_with(&mut out, false);
        double_sha256(&out)
    }

    /// Hash of the full encoding, internal byte order
    pub fn wtxid(&self) -> [u8; 32] {
        double_sha256(&self.to_bytes())
    }

    fn encode_with(&self, out: &mut Vec<u8>, witness: bool) {
        self.version.encode(out);
        if witness {
            out.push(0x00);
            out.push(TxFlags::WITNESS.bits());
        }
        self.inputs.encode(out);
        self.outputs.encode(out);
        if witness {
            for input in &self.inputs {
                input.witness.encode(out);
            }
        }
        self.lock_time.encode(out);
    }
}

impl Decodable for Transaction {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        let version = u32::decode(src)?;
        let mut flags = TxFlags::empty();

        let mut inputs = Vec::<TxIn>::decode(src)?;
        let mut outputs = Vec::new();
        if inputs.is_empty() {
            // Either a genuinely empty input list or the witness marker
            flags = TxFlags::from_bits_retain(u8::decode(src)?);
            if !flags.is_empty() {
                inputs = Vec::decode(src)?;
                outputs = Vec::decode(src)?;
            }
        } else {
            // Legacy form: no flag byte present
            outputs = Vec::decode(src)?;
        }

        if flags.contains(TxFlags::WITNESS) {
            flags.remove(TxFlags::WITNESS);
            for input in inputs.iter_mut() {
                input.witness = Witness::decode(src)?;
            }
            if inputs.iter().all(|input| input.witness.is_empty()) {
                return Err(DecodeError::SuperfluousWitness);
            }
        }
        if !flags.is_empty() {
            return Err(DecodeError::UnknownTransactionFlags(flags.bits()));
        }

        let lock_time = u32::decode(src)?;

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }
}

impl Encodable for Transaction {
    fn encode(&self, out: &mut Vec<u8>) {
        self.encode_with(out, self.has_witness());
    }
}
