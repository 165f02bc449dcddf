//! Record fixtures shared by the decoder and scanner tests

use crate::codec::{Decodable, DecodeError, Encodable};
use crate::core::block::{Block, BlockHeader};
use crate::core::transaction::{OutPoint, Transaction, TxIn, TxOut, Witness, SEQUENCE_FINAL};
use crate::script::Script;
use crate::stream::BufferedSource;
use std::io::Cursor;

/// Coinbase transaction of the mainnet genesis block
pub const GENESIS_COINBASE_HEX: &str = concat!(
    "01000000010000000000000000000000000000000000000000000000000000000000000000",
    "ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368",
    "616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420",
    "666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a6",
    "7130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c",
    "384df7ba0b8d578a4c702b6bf11d5fac00000000",
);

pub const GENESIS_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

pub const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

/// Key-hash address of the genesis output's public key
pub const GENESIS_ADDRESS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

pub fn decode_bytes<T: Decodable>(bytes: Vec<u8>) -> Result<T, DecodeError> {
    let mut src = BufferedSource::new(Cursor::new(bytes), 4096, 1024)?;
    T::decode(&mut src)
}

pub fn genesis_block() -> Block {
    let coinbase = hex::decode(GENESIS_COINBASE_HEX).unwrap();
    let tx = decode_bytes::<Transaction>(coinbase).unwrap();

    Block {
        header: BlockHeader {
            version: 1,
            prev_block: [0u8; 32],
            merkle_root: tx.txid(),
            time: 1_231_006_505,
            bits: 0x1d00_ffff,
            nonce: 2_083_236_893,
        },
        transactions: vec![tx],
    }
}

pub fn p2pkh_script(hash: &[u8; 20]) -> Script {
    let mut script = vec![0x76, 0xa9, 0x14];
    script.extend_from_slice(hash);
    script.extend_from_slice(&[0x88, 0xac]);
    Script::new(script)
}

/// One coinbase paying each hash in turn, then an OP_RETURN output.
pub fn p2pkh_block(hashes: &[[u8; 20]]) -> Block {
    let mut outputs: Vec<TxOut> = hashes
        .iter()
        .map(|hash| TxOut {
            value: 1_000,
            script_pubkey: p2pkh_script(hash),
        })
        .collect();
    outputs.push(TxOut {
        value: 0,
        script_pubkey: Script::new(vec![0x6a, 0x02, 0xbe, 0xef]),
    });

    let tx = Transaction {
        version: 1,
        inputs: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: Script::new(vec![0x01, 0x07]),
            sequence: SEQUENCE_FINAL,
            witness: Witness::default(),
        }],
        outputs,
        lock_time: 0,
    };

    Block {
        header: BlockHeader {
            version: 2,
            prev_block: [0x5a; 32],
            merkle_root: tx.txid(),
            time: 1_600_000_000,
            bits: 0x207f_ffff,
            nonce: 7,
        },
        transactions: vec![tx],
    }
}

/// `marker || length || block` as it sits in a block file.
pub fn frame(marker: [u8; 4], block: &Block) -> Vec<u8> {
    let payload = block.to_bytes();
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&marker);
    (payload.len() as u32).encode(&mut out);
    out.extend_from_slice(&payload);
    out
}
