//! Kernel error type.

use proto_kernel_buffers::BufferError;
use thiserror::Error;

use crate::wire::WireType;

/// Error type for kernel parsing and field access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("invalid field number: {0}")]
    InvalidFieldNumber(u64),
    #[error("invalid wire type: {0}")]
    InvalidWireType(u8),
    #[error("end group marker for field {0} without matching start group")]
    UnexpectedEndGroup(u32),
    #[error("group for field {expected} closed by end group marker for field {found}")]
    MismatchedEndGroup { expected: u32, found: u32 },
    #[error("group for field {0} is not terminated")]
    UnterminatedGroup(u32),
    #[error("field {field_number} does not hold a {expected:?} value")]
    WireTypeMismatch {
        field_number: u32,
        expected: WireType,
    },
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("index {index} out of bounds for repeated field of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },
}
