//! Locking scripts and their standard templates
//!
//! - `opcodes`: the handful of opcodes the templates are built from
//! - `solver`: template matching and destination extraction

pub mod opcodes;
pub mod solver;

pub use opcodes::Opcode;
pub use solver::{classify, Destination, ScriptKind, ScriptPattern};

use crate::codec::{read_var_bytes, write_var_bytes, Decodable, DecodeError, Encodable};
use crate::stream::BufferedSource;
use std::io::Read;

/// Raw script bytes as carried by an output (or input)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Match the script against the standard templates
    pub fn pattern(&self) -> ScriptPattern {
        classify(&self.0)
    }
}

impl Decodable for Script {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(Self(read_var_bytes(src)?))
    }
}

impl Encodable for Script {
    fn encode(&self, out: &mut Vec<u8>) {
        write_var_bytes(&self.0, out);
    }
}
