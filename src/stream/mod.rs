//! Byte source for block data files
//!
//! This module provides:
//! - A fixed-capacity ring addressed by absolute stream positions
//! - A buffered, forward-only reader with bounded rewind, a read fence
//!   and a raw byte search primitive

pub mod buffered;
pub mod ring;

pub use buffered::{BufferedSource, StreamError};
pub use ring::Ring;
