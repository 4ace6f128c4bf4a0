//! Byte buffers for the proto-kernel wire codec.
//!
//! [`Writer`] appends varints, little-endian fixed-width integers and raw
//! bytes into a growable buffer. [`Reader`] walks a byte slice with
//! bounds-checked reads that report [`BufferError`] instead of panicking.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for buffer reads.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("varint is longer than 10 bytes")]
    VarintTooLong,
}
