//! Growable binary writer for the proto wire format.

/// A binary buffer writer that grows automatically as needed.
///
/// Fixed-width integers are written little-endian, as the proto wire format
/// requires. Variable-length integers use base-128 groups with the high bit
/// as continuation flag.
///
/// # Example
///
/// ```
/// use proto_kernel_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.varint(300);
/// writer.fixed32(1);
/// assert_eq!(writer.flush(), [0xac, 0x02, 0x01, 0x00, 0x00, 0x00]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Position where last flush happened.
    pub x0: usize,
    /// Current cursor position.
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with the default allocation size (1KB).
    pub fn new() -> Self {
        Self::with_alloc_size(1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        Self {
            uint8: vec![0u8; alloc_size],
            x0: 0,
            x: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining >= capacity {
            return;
        }
        let pending = self.x - self.x0;
        let required = pending + capacity;
        let new_size = if required <= self.alloc_size {
            self.alloc_size
        } else {
            required * 2
        };
        let mut grown = vec![0u8; new_size];
        grown[..pending].copy_from_slice(&self.uint8[self.x0..self.x]);
        self.uint8 = grown;
        self.x = pending;
        self.x0 = 0;
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.x - self.x0
    }

    /// Returns `true` when nothing was written since the last flush.
    pub fn is_empty(&self) -> bool {
        self.x == self.x0
    }

    /// Returns the written data and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.x0 = self.x;
        result
    }

    /// Writes an unsigned base-128 varint (1 to 10 bytes).
    pub fn varint(&mut self, mut val: u64) {
        self.ensure_capacity(10);
        while val >= 0x80 {
            self.uint8[self.x] = (val as u8 & 0x7f) | 0x80;
            self.x += 1;
            val >>= 7;
        }
        self.uint8[self.x] = val as u8;
        self.x += 1;
    }

    /// Writes an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn fixed32(&mut self, val: u32) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn fixed64(&mut self, val: u64) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes a varint length prefix followed by the bytes.
    pub fn delimited(&mut self, buf: &[u8]) {
        self.varint(buf.len() as u64);
        self.buf(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_single_byte() {
        let mut writer = Writer::new();
        writer.varint(0);
        writer.varint(1);
        writer.varint(127);
        assert_eq!(writer.flush(), [0x00, 0x01, 0x7f]);
    }

    #[test]
    fn test_varint_multi_byte() {
        let mut writer = Writer::new();
        writer.varint(128);
        assert_eq!(writer.flush(), [0x80, 0x01]);
        writer.varint(12345);
        assert_eq!(writer.flush(), [0xb9, 0x60]);
        writer.varint(u64::MAX);
        let data = writer.flush();
        assert_eq!(data.len(), 10);
        assert_eq!(data[9], 0x01);
    }

    #[test]
    fn test_fixed_little_endian() {
        let mut writer = Writer::new();
        writer.fixed32(0x01020304);
        assert_eq!(writer.flush(), [0x04, 0x03, 0x02, 0x01]);
        writer.fixed64(1);
        assert_eq!(writer.flush(), [1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_delimited() {
        let mut writer = Writer::new();
        writer.delimited(b"abc");
        assert_eq!(writer.flush(), [0x03, b'a', b'b', b'c']);
    }

    #[test]
    fn test_grows_past_alloc_size() {
        let mut writer = Writer::with_alloc_size(2);
        writer.buf(&[1, 2, 3, 4, 5]);
        writer.varint(6);
        assert_eq!(writer.len(), 6);
        assert_eq!(writer.flush(), [1, 2, 3, 4, 5, 6]);
        assert!(writer.is_empty());
    }
}
