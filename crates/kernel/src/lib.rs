//! Schema-less binary kernel for the proto wire format.
//!
//! A [`Kernel`] holds the fields of one message keyed by field number and
//! exposes typed accessors over them. It parses lazily: [`Kernel::from_bytes`]
//! indexes the top-level fields and validates their framing, while nested
//! messages and groups stay as raw bytes until an accessor reads them.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | `kernel` | [`Kernel`] accessors and serialization |
//! | `message` | [`InternalMessage`] capability trait |
//! | `wire` | [`WireType`], tag encoding |
//! | `storage` | pivot-split slot/map field storage |
//! | `indexer` | top-level parsing and group framing checks |

mod error;
mod field;
mod indexer;
mod kernel;
mod message;
mod storage;
mod wire;

pub use error::KernelError;
pub use kernel::Kernel;
pub use message::InternalMessage;
pub use storage::DEFAULT_PIVOT;
pub use wire::{WireType, MAX_FIELD_NUMBER};
