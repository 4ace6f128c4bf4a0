//! Bounds-checked binary reader with cursor tracking.

use crate::BufferError;

/// A binary buffer reader over a byte slice.
///
/// Every read is bounds-checked and leaves the cursor untouched when it
/// fails, so callers can report the offset of the bad input.
///
/// # Example
///
/// ```
/// use proto_kernel_buffers::{BufferError, Reader};
///
/// let data = [0xac, 0x02, 0x2a];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.varint(), Ok(300));
/// assert_eq!(reader.fixed32(), Err(BufferError::EndOfBuffer));
/// assert_eq!(reader.buf(1), Ok(&[0x2a][..]));
/// assert!(reader.is_empty());
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len() - self.x
    }

    /// Returns `true` when the cursor reached the end of the input.
    pub fn is_empty(&self) -> bool {
        self.x >= self.uint8.len()
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if n > self.size() {
            Err(BufferError::EndOfBuffer)
        } else {
            Ok(())
        }
    }

    /// Reads an unsigned base-128 varint of at most 10 bytes.
    pub fn varint(&mut self) -> Result<u64, BufferError> {
        let mut result: u64 = 0;
        let mut x = self.x;
        for shift in (0..70).step_by(7) {
            let Some(&b) = self.uint8.get(x) else {
                return Err(BufferError::EndOfBuffer);
            };
            x += 1;
            result |= ((b & 0x7f) as u64) << shift;
            if b & 0x80 == 0 {
                self.x = x;
                return Ok(result);
            }
        }
        Err(BufferError::VarintTooLong)
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    pub fn fixed32(&mut self) -> Result<u32, BufferError> {
        let bytes = self.buf(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads an unsigned 64-bit integer (little-endian).
    pub fn fixed64(&mut self) -> Result<u64, BufferError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.buf(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Returns a subslice of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.uint8[x..self.x])
    }

    /// Reads a varint length prefix, then that many bytes.
    pub fn delimited(&mut self) -> Result<&'a [u8], BufferError> {
        let start = self.x;
        let length = self.varint()?;
        let length = usize::try_from(length).map_err(|_| BufferError::EndOfBuffer)?;
        match self.buf(length) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                self.x = start;
                Err(err)
            }
        }
    }
}
