//! Type-tagged extension container over the proto-kernel wire format.
//!
//! A [`MessageSet`] attaches arbitrary sub-messages to one message, each
//! tagged with an integer type id. It predates native extension support and
//! keeps its legacy wire form: the items are a repeated *group* at field 1,
//! each group holding the type id (field 2, varint) and the message
//! (field 3, length-delimited). The set itself embeds into a parent as an
//! ordinary length-delimited message.
//!
//! ```text
//! 52 0A          parent field 10, 10 bytes
//!   0B           start group 1
//!     10 B9 60   type id 12345
//!     1A 03 ..   message, 3 bytes
//!   0C           end group 1
//! ```
//!
//! Lookups resolve to the last item with a matching type id. Attach calls
//! lend out the stored message slot mutably, so edits are written through.

mod item;
mod message_set;

pub use item::Item;
pub use message_set::MessageSet;

/// Field of the set's kernel holding the item groups.
pub const ITEM_FIELD_NUMBER: u32 = 1;
/// Field of an item holding the type id.
pub const TYPE_ID_FIELD_NUMBER: u32 = 2;
/// Field of an item holding the embedded message.
pub const MESSAGE_FIELD_NUMBER: u32 = 3;
