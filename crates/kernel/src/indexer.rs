//! Splits a serialized message into per-field values.
//!
//! Only the top level is decoded: delimited payloads are kept as raw bytes,
//! and group contents are walked for framing but kept raw until read.

use proto_kernel_buffers::Reader;

use crate::field::Value;
use crate::storage::Storage;
use crate::wire::{read_tag, WireType};
use crate::KernelError;

pub(crate) fn build_storage(reader: &mut Reader<'_>, pivot: usize) -> Result<Storage, KernelError> {
    let mut storage = Storage::new(pivot);
    while !reader.is_empty() {
        let (field_number, wire_type) = read_tag(reader)?;
        let value = match wire_type {
            WireType::Varint => Value::Varint(reader.varint()?),
            WireType::Fixed64 => Value::Fixed64(reader.fixed64()?),
            WireType::Delimited => Value::Delimited(reader.delimited()?.to_vec()),
            WireType::StartGroup => Value::Group(skip_group(reader, field_number)?.to_vec()),
            WireType::EndGroup => return Err(KernelError::UnexpectedEndGroup(field_number)),
            WireType::Fixed32 => Value::Fixed32(reader.fixed32()?),
        };
        storage.entry(field_number).values.push(value);
    }
    Ok(storage)
}

/// Advances past a group whose start tag was just read and returns its
/// contents, excluding the end marker.
///
/// Nested groups are tracked on an explicit stack, so nesting depth is bounded
/// by the input length rather than the call stack.
fn skip_group<'a>(reader: &mut Reader<'a>, field_number: u32) -> Result<&'a [u8], KernelError> {
    let start = reader.x;
    let mut open = vec![field_number];
    while let Some(&innermost) = open.last() {
        if reader.is_empty() {
            return Err(KernelError::UnterminatedGroup(innermost));
        }
        let tag_start = reader.x;
        let (nested, wire_type) = read_tag(reader)?;
        match wire_type {
            WireType::EndGroup if nested == innermost => {
                open.pop();
                if open.is_empty() {
                    return Ok(&reader.uint8[start..tag_start]);
                }
            }
            WireType::EndGroup => {
                return Err(KernelError::MismatchedEndGroup {
                    expected: innermost,
                    found: nested,
                });
            }
            WireType::StartGroup => open.push(nested),
            WireType::Varint => {
                reader.varint()?;
            }
            WireType::Fixed64 => {
                reader.fixed64()?;
            }
            WireType::Delimited => {
                reader.delimited()?;
            }
            WireType::Fixed32 => {
                reader.fixed32()?;
            }
        }
    }
    Err(KernelError::UnterminatedGroup(field_number))
}
