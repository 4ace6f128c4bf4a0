//! Wire types and tag encoding.

use proto_kernel_buffers::{Reader, Writer};

use crate::KernelError;

/// Largest field number the wire format can address.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The three low bits of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Delimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = KernelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::Delimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(KernelError::InvalidWireType(other)),
        }
    }
}

pub(crate) fn write_tag(writer: &mut Writer, field_number: u32, wire_type: WireType) {
    writer.varint(((field_number as u64) << 3) | wire_type as u64);
}

pub(crate) fn read_tag(reader: &mut Reader<'_>) -> Result<(u32, WireType), KernelError> {
    let tag = reader.varint()?;
    let field_number = tag >> 3;
    if field_number == 0 || field_number > MAX_FIELD_NUMBER as u64 {
        return Err(KernelError::InvalidFieldNumber(field_number));
    }
    let wire_type = WireType::try_from((tag & 0x07) as u8)?;
    Ok((field_number as u32, wire_type))
}
