//! Buffered reader over a forward-only byte origin
//!
//! `BufferedSource` wraps any `Read` (normally an open block file) with a
//! ring buffer so the caller can:
//! - rewind a guaranteed number of bytes after reading past them
//! - fence reads so a single record can never consume its neighbour
//! - scan forward for a marker byte without decoding anything
//!
//! Two counters drive everything: `fetched` (bytes pulled from the origin)
//! and `consumed` (the caller's cursor). At all times
//! `window_start() <= consumed <= fetched`, and a refill never overwrites
//! the `rewind` bytes sitting immediately behind `consumed`.

use super::ring::Ring;
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;

/// Largest chunk allocated at once when reading a length-prefixed blob.
const READ_CHUNK: usize = 64 * 1024;

/// Errors raised by the byte source
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("End of data")]
    EndOfData,
    #[error("Read past frame fence: {requested} bytes at position {position}, fence at {fence}")]
    EndOfFrame {
        position: u64,
        requested: usize,
        fence: u64,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Rewind limit {rewind} must be less than buffer size {capacity}")]
    InvalidRewind { rewind: usize, capacity: usize },
    #[error("Seek offset out of range: {0}")]
    SeekOutOfRange(u64),
}

/// Ring-buffered reader with bounded rewind and an optional read fence.
///
/// The origin is dropped (closing the file) as soon as it reports end of
/// data or an I/O error; after that only already-buffered bytes can be read.
#[derive(Debug)]
pub struct BufferedSource<R> {
    source: Option<R>,
    ring: Ring,
    /// First position the ring was ever filled from (moves on seek)
    origin: u64,
    /// How many bytes have been read from the origin
    fetched: u64,
    /// How many bytes the caller has consumed
    consumed: u64,
    /// Reads may not go past this position
    fence: Option<u64>,
    /// How many bytes behind the cursor a refill must leave intact
    rewind: u64,
}

impl<R: Read> BufferedSource<R> {
    /// Create a source with a `capacity`-byte ring that guarantees `rewind`
    /// bytes of rewind. `rewind` must be strictly less than `capacity`.
    pub fn new(source: R, capacity: usize, rewind: usize) -> Result<Self, StreamError> {
        if rewind >= capacity {
            return Err(StreamError::InvalidRewind { rewind, capacity });
        }

        Ok(Self {
            source: Some(source),
            ring: Ring::new(capacity),
            origin: 0,
            fetched: 0,
            consumed: 0,
            fence: None,
            rewind: rewind as u64,
        })
    }

    /// Current read position (absolute offset into the origin).
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Bytes fetched from the origin so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn fence(&self) -> Option<u64> {
        self.fence
    }

    /// Lowest position `set_cursor` can reach without clamping.
    pub fn window_start(&self) -> u64 {
        self.origin
            .max(self.fetched.saturating_sub(self.ring.capacity() as u64))
    }

    /// True once the cursor has caught up with an exhausted origin.
    pub fn at_end(&self) -> bool {
        self.consumed == self.fetched && self.source.is_none()
    }

    /// Release the origin early. Buffered bytes remain readable.
    pub fn close(&mut self) {
        self.source = None;
    }

    /// Pull more bytes from the origin into the ring.
    ///
    /// Only called with `consumed == fetched`, so at least
    /// `capacity - rewind` slots are free.
    fn fill(&mut self) -> Result<(), StreamError> {
        debug_assert_eq!(self.consumed, self.fetched);

        let capacity = self.ring.capacity() as u64;
        let available = capacity
            .saturating_sub(self.fetched - self.consumed)
            .saturating_sub(self.rewind);
        let want = available.min(self.ring.run_len(self.fetched) as u64) as usize;
        debug_assert!(want > 0);

        let source = match self.source.as_mut() {
            Some(source) => source,
            None => return Err(StreamError::EndOfData),
        };
        let buf = self.ring.writable(self.fetched, want);

        let result = loop {
            match source.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match result {
            Ok(0) => {
                self.close();
                Err(StreamError::EndOfData)
            }
            Ok(n) => {
                self.fetched += n as u64;
                Ok(())
            }
            Err(e) => {
                log::warn!("Read failed at offset {}: {}", self.fetched, e);
                self.close();
                Err(StreamError::Io(e))
            }
        }
    }

    fn check_fence(&self, len: usize) -> Result<(), StreamError> {
        match self.fence {
            Some(fence) if self.consumed + len as u64 > fence => Err(StreamError::EndOfFrame {
                position: self.consumed,
                requested: len,
                fence,
            }),
            _ => Ok(()),
        }
    }

    /// Fill `out` completely or fail.
    ///
    /// Fails with `EndOfFrame` before reading anything if the read would
    /// cross the fence, and with `EndOfData` if the origin runs dry.
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<(), StreamError> {
        self.check_fence(out.len())?;

        let mut filled = 0;
        while filled < out.len() {
            if self.consumed == self.fetched {
                self.fill()?;
            }
            let pending = (self.fetched - self.consumed) as usize;
            let chunk = self.ring.readable(self.consumed, pending.min(out.len() - filled));
            let n = chunk.len();
            out[filled..filled + n].copy_from_slice(chunk);
            filled += n;
            self.consumed += n as u64;
        }

        Ok(())
    }

    /// Read exactly `N` bytes.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StreamError> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes into a fresh vector.
    ///
    /// The fence is checked up front and memory grows in bounded chunks, so
    /// a hostile length prefix cannot force a large allocation.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, StreamError> {
        self.check_fence(len)?;

        let mut out = Vec::with_capacity(len.min(READ_CHUNK));
        while out.len() < len {
            let start = out.len();
            let step = (len - start).min(READ_CHUNK);
            out.resize(start + step, 0);
            self.read_into(&mut out[start..])?;
        }

        Ok(out)
    }

    /// Move the cursor to `pos`.
    ///
    /// Positions older than `window_start()` or newer than `fetched()` are
    /// clamped to the nearest reachable position and `false` is returned.
    pub fn set_cursor(&mut self, pos: u64) -> bool {
        let floor = self.window_start();
        if pos < floor {
            self.consumed = floor;
            return false;
        }
        if pos > self.fetched {
            self.consumed = self.fetched;
            return false;
        }
        self.consumed = pos;
        true
    }

    /// Forbid reads beyond `fence`; `None` removes the limit.
    ///
    /// A fence behind the cursor is rejected and nothing changes.
    pub fn set_fence(&mut self, fence: Option<u64>) -> bool {
        if let Some(pos) = fence {
            if pos < self.consumed {
                return false;
            }
        }
        self.fence = fence;
        true
    }

    /// Advance until the byte under the cursor equals `byte`.
    ///
    /// The matching byte is not consumed. Propagates `EndOfData` if the
    /// origin is exhausted first. The fence is not consulted.
    pub fn find_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        loop {
            if self.consumed == self.fetched {
                self.fill()?;
            }
            let pending = (self.fetched - self.consumed) as usize;
            let run = self.ring.readable(self.consumed, pending);
            match run.iter().position(|&b| b == byte) {
                Some(offset) => {
                    self.consumed += offset as u64;
                    return Ok(());
                }
                None => self.consumed += run.len() as u64,
            }
        }
    }
}

impl<R: Read + Seek> BufferedSource<R> {
    /// Reposition the origin to absolute offset `pos` and discard the
    /// buffered window.
    pub fn seek_absolute(&mut self, pos: u64) -> Result<(), StreamError> {
        if i64::try_from(pos).is_err() {
            return Err(StreamError::SeekOutOfRange(pos));
        }
        let source = self.source.as_mut().ok_or(StreamError::EndOfData)?;

        match source.seek(SeekFrom::Start(pos)) {
            Ok(reached) => {
                self.origin = reached;
                self.fetched = reached;
                self.consumed = reached;
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(StreamError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn counting(len: u8) -> Cursor<Vec<u8>> {
        Cursor::new((0..len).collect())
    }

    #[test]
    fn test_rewind_must_be_smaller_than_buffer() {
        let result = BufferedSource::new(counting(4), 8, 8);
        assert!(matches!(
            result,
            Err(StreamError::InvalidRewind {
                rewind: 8,
                capacity: 8
            })
        ));
    }

    #[test]
    fn test_reads_across_ring_wrap() {
        let mut src = BufferedSource::new(counting(40), 8, 3).unwrap();

        assert_eq!(src.read_array::<5>().unwrap(), [0, 1, 2, 3, 4]);
        let next = src.read_vec(10).unwrap();
        assert_eq!(next, (5..15).collect::<Vec<u8>>());
        assert_eq!(src.position(), 15);
    }

    #[test]
    fn test_rewind_reproduces_bytes() {
        let mut src = BufferedSource::new(counting(64), 16, 6).unwrap();
        src.read_vec(20).unwrap();

        let seen = src.read_vec(5).unwrap();
        let current = src.position();
        assert!(src.set_cursor(current - 5));
        assert_eq!(src.read_vec(5).unwrap(), seen);
        assert_eq!(src.position(), current);
    }

    #[test]
    fn test_set_cursor_clamps_out_of_window() {
        let mut src = BufferedSource::new(counting(64), 8, 3).unwrap();
        src.read_vec(30).unwrap();

        assert!(!src.set_cursor(0));
        assert_eq!(src.position(), src.window_start());

        assert!(!src.set_cursor(src.fetched() + 10));
        assert_eq!(src.position(), src.fetched());
    }

    #[test]
    fn test_fence_blocks_reads() {
        let mut src = BufferedSource::new(counting(20), 16, 4).unwrap();
        assert!(src.set_fence(Some(4)));

        assert_eq!(src.read_array::<4>().unwrap(), [0, 1, 2, 3]);
        assert!(matches!(
            src.read_array::<1>(),
            Err(StreamError::EndOfFrame { fence: 4, .. })
        ));
        // The failed read must not move the cursor
        assert_eq!(src.position(), 4);

        assert!(!src.set_fence(Some(2)));
        assert_eq!(src.fence(), Some(4));

        assert!(src.set_fence(None));
        assert_eq!(src.read_array::<1>().unwrap(), [4]);
    }

    #[test]
    fn test_find_byte_leaves_cursor_on_match() {
        let data = vec![1, 2, 3, 9, 4];
        let mut src = BufferedSource::new(Cursor::new(data), 4, 1).unwrap();

        src.find_byte(9).unwrap();
        assert_eq!(src.position(), 3);
        assert_eq!(src.read_array::<1>().unwrap(), [9]);
    }

    #[test]
    fn test_find_byte_runs_out_of_data() {
        let mut src = BufferedSource::new(counting(10), 4, 1).unwrap();

        assert!(matches!(src.find_byte(0xff), Err(StreamError::EndOfData)));
        assert!(src.at_end());
    }

    #[test]
    fn test_read_past_end() {
        let mut src = BufferedSource::new(counting(3), 8, 2).unwrap();
        assert!(!src.at_end());
        assert!(matches!(src.read_vec(4), Err(StreamError::EndOfData)));
        assert!(src.at_end());
    }

    #[test]
    fn test_seek_absolute_discards_window() {
        let mut src = BufferedSource::new(counting(50), 16, 4).unwrap();
        src.read_vec(10).unwrap();

        src.seek_absolute(30).unwrap();
        assert_eq!(src.position(), 30);
        assert_eq!(src.window_start(), 30);
        assert!(!src.set_cursor(5));
        assert_eq!(src.read_array::<2>().unwrap(), [30, 31]);

        assert!(matches!(
            src.seek_absolute(u64::MAX),
            Err(StreamError::SeekOutOfRange(_))
        ));
    }
}
