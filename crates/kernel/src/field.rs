//! Stored field values.

use crate::wire::WireType;
use crate::Kernel;

/// One occurrence of a field, either as read from the wire or materialized.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    Varint(u64),
    Fixed64(u64),
    Fixed32(u32),
    /// Raw length-delimited payload (bytes, string or unparsed message).
    Delimited(Vec<u8>),
    /// Raw group contents, without the start and end markers.
    Group(Vec<u8>),
    /// Parsed length-delimited message.
    Message(Kernel),
    /// Parsed group element.
    GroupMessage(Kernel),
}

impl Value {
    pub(crate) fn wire_type(&self) -> WireType {
        match self {
            Value::Varint(_) => WireType::Varint,
            Value::Fixed64(_) => WireType::Fixed64,
            Value::Fixed32(_) => WireType::Fixed32,
            Value::Delimited(_) | Value::Message(_) => WireType::Delimited,
            Value::Group(_) | Value::GroupMessage(_) => WireType::StartGroup,
        }
    }
}

/// All occurrences of one field number, in wire order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Field {
    pub(crate) values: Vec<Value>,
}

impl Field {
    pub(crate) fn single(value: Value) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// The occurrence that wins for scalar reads.
    pub(crate) fn last(&self) -> Option<&Value> {
        self.values.last()
    }
}
