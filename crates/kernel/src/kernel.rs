//! The binary kernel: field storage with typed accessors.

use std::borrow::Cow;

use proto_kernel_buffers::{Reader, Writer};

use crate::field::{Field, Value};
use crate::indexer::build_storage;
use crate::storage::{Storage, DEFAULT_PIVOT};
use crate::wire::{write_tag, WireType};
use crate::{InternalMessage, KernelError};

/// Field storage for one message, keyed by field number.
///
/// A kernel knows nothing about the schema of the message it holds. Callers
/// pick the accessor matching the declared field type:
///
/// - scalars read the last occurrence of a field and default to zero or
///   empty when the field is absent;
/// - singular messages merge every occurrence, the way concatenated wire data
///   is merged;
/// - repeated groups keep every element in order.
///
/// Nested messages are parsed lazily. Read accessors hand out owned copies;
/// the `*_attach` and `*_mut` accessors parse the slot in place and lend it
/// out mutably, so edits land in this kernel's serialized form.
///
/// # Example
///
/// ```
/// use proto_kernel::Kernel;
///
/// let mut kernel = Kernel::new();
/// kernel.set_int32(20, 30);
/// assert_eq!(kernel.serialize(), [0xa0, 0x01, 0x1e]);
///
/// let parsed = Kernel::from_bytes(&kernel.serialize()).unwrap();
/// assert_eq!(parsed.get_int32_with_default(20), Ok(30));
/// ```
#[derive(Debug, Clone)]
pub struct Kernel {
    storage: Storage,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl InternalMessage for Kernel {
    fn internal_get_kernel(&self) -> &Kernel {
        self
    }

    fn into_kernel(self) -> Kernel {
        self
    }
}

impl Kernel {
    /// Creates an empty kernel with the default pivot.
    pub fn new() -> Self {
        Self::with_pivot(DEFAULT_PIVOT)
    }

    /// Creates an empty kernel whose fields below `pivot` use slot storage.
    pub fn with_pivot(pivot: usize) -> Self {
        Self {
            storage: Storage::new(pivot),
        }
    }

    /// Parses a serialized message with the default pivot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KernelError> {
        Self::from_bytes_with_pivot(bytes, DEFAULT_PIVOT)
    }

    /// Parses a serialized message.
    ///
    /// Every top-level tag is validated, including group framing. Nested
    /// message payloads are only checked once they are read.
    pub fn from_bytes_with_pivot(bytes: &[u8], pivot: usize) -> Result<Self, KernelError> {
        let mut reader = Reader::new(bytes);
        match build_storage(&mut reader, pivot) {
            Ok(storage) => {
                tracing::trace!(
                    len = bytes.len(),
                    fields = storage.len(),
                    "indexed kernel buffer"
                );
                Ok(Self { storage })
            }
            Err(err) => {
                tracing::debug!(
                    %err,
                    offset = reader.x,
                    len = bytes.len(),
                    "failed to index kernel buffer"
                );
                Err(err)
            }
        }
    }

    /// The field-number threshold between slot and map storage.
    pub fn pivot(&self) -> usize {
        self.storage.pivot()
    }

    /// Produces the canonical serialized form, fields in ascending order.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write_to(&mut writer);
        writer.flush()
    }

    fn write_to(&self, writer: &mut Writer) {
        for (field_number, field) in self.storage.iter() {
            for value in &field.values {
                write_tag(writer, field_number, value.wire_type());
                match value {
                    Value::Varint(v) => writer.varint(*v),
                    Value::Fixed64(v) => writer.fixed64(*v),
                    Value::Fixed32(v) => writer.fixed32(*v),
                    Value::Delimited(bytes) => writer.delimited(bytes),
                    Value::Message(kernel) => writer.delimited(&kernel.serialize()),
                    Value::Group(contents) => {
                        writer.buf(contents);
                        write_tag(writer, field_number, WireType::EndGroup);
                    }
                    Value::GroupMessage(kernel) => {
                        kernel.write_to(writer);
                        write_tag(writer, field_number, WireType::EndGroup);
                    }
                }
            }
        }
    }

    /// Returns `true` if the field has at least one occurrence.
    pub fn has_field_number(&self, field_number: u32) -> bool {
        self.storage
            .get(field_number)
            .is_some_and(|field| !field.values.is_empty())
    }

    /// Removes every occurrence of the field.
    pub fn clear_field(&mut self, field_number: u32) {
        self.storage.delete(field_number);
    }

    fn set_value(&mut self, field_number: u32, value: Value) {
        self.storage.set(field_number, Field::single(value));
    }

    fn last_value(&self, field_number: u32) -> Option<&Value> {
        self.storage.get(field_number).and_then(Field::last)
    }

    fn mismatch(field_number: u32, expected: WireType) -> KernelError {
        KernelError::WireTypeMismatch {
            field_number,
            expected,
        }
    }

    // ---------------------------------------------------------------- scalars

    fn read_varint(&self, field_number: u32) -> Result<u64, KernelError> {
        match self.last_value(field_number) {
            None => Ok(0),
            Some(Value::Varint(v)) => Ok(*v),
            Some(_) => Err(Self::mismatch(field_number, WireType::Varint)),
        }
    }

    fn read_fixed32(&self, field_number: u32) -> Result<u32, KernelError> {
        match self.last_value(field_number) {
            None => Ok(0),
            Some(Value::Fixed32(v)) => Ok(*v),
            Some(_) => Err(Self::mismatch(field_number, WireType::Fixed32)),
        }
    }

    fn read_fixed64(&self, field_number: u32) -> Result<u64, KernelError> {
        match self.last_value(field_number) {
            None => Ok(0),
            Some(Value::Fixed64(v)) => Ok(*v),
            Some(_) => Err(Self::mismatch(field_number, WireType::Fixed64)),
        }
    }

    fn read_delimited(&self, field_number: u32) -> Result<Cow<'_, [u8]>, KernelError> {
        match self.last_value(field_number) {
            None => Ok(Cow::Borrowed(&[])),
            Some(Value::Delimited(bytes)) => Ok(Cow::Borrowed(bytes)),
            Some(Value::Message(kernel)) => Ok(Cow::Owned(kernel.serialize())),
            Some(_) => Err(Self::mismatch(field_number, WireType::Delimited)),
        }
    }

    pub fn get_int32_with_default(&self, field_number: u32) -> Result<i32, KernelError> {
        Ok(self.read_varint(field_number)? as i32)
    }

    pub fn set_int32(&mut self, field_number: u32, value: i32) {
        self.set_value(field_number, Value::Varint(value as i64 as u64));
    }

    pub fn get_int64_with_default(&self, field_number: u32) -> Result<i64, KernelError> {
        Ok(self.read_varint(field_number)? as i64)
    }

    pub fn set_int64(&mut self, field_number: u32, value: i64) {
        self.set_value(field_number, Value::Varint(value as u64));
    }

    pub fn get_uint32_with_default(&self, field_number: u32) -> Result<u32, KernelError> {
        Ok(self.read_varint(field_number)? as u32)
    }

    pub fn set_uint32(&mut self, field_number: u32, value: u32) {
        self.set_value(field_number, Value::Varint(value as u64));
    }

    pub fn get_uint64_with_default(&self, field_number: u32) -> Result<u64, KernelError> {
        self.read_varint(field_number)
    }

    pub fn set_uint64(&mut self, field_number: u32, value: u64) {
        self.set_value(field_number, Value::Varint(value));
    }

    pub fn get_bool_with_default(&self, field_number: u32) -> Result<bool, KernelError> {
        Ok(self.read_varint(field_number)? != 0)
    }

    pub fn set_bool(&mut self, field_number: u32, value: bool) {
        self.set_value(field_number, Value::Varint(value as u64));
    }

    /// Reads a zigzag-encoded signed 32-bit field.
    pub fn get_sint32_with_default(&self, field_number: u32) -> Result<i32, KernelError> {
        let n = self.read_varint(field_number)? as u32;
        Ok(((n >> 1) as i32) ^ -((n & 1) as i32))
    }

    pub fn set_sint32(&mut self, field_number: u32, value: i32) {
        let encoded = ((value << 1) ^ (value >> 31)) as u32;
        self.set_value(field_number, Value::Varint(encoded as u64));
    }

    pub fn get_fixed32_with_default(&self, field_number: u32) -> Result<u32, KernelError> {
        self.read_fixed32(field_number)
    }

    pub fn set_fixed32(&mut self, field_number: u32, value: u32) {
        self.set_value(field_number, Value::Fixed32(value));
    }

    pub fn get_fixed64_with_default(&self, field_number: u32) -> Result<u64, KernelError> {
        self.read_fixed64(field_number)
    }

    pub fn set_fixed64(&mut self, field_number: u32, value: u64) {
        self.set_value(field_number, Value::Fixed64(value));
    }

    pub fn get_float_with_default(&self, field_number: u32) -> Result<f32, KernelError> {
        Ok(f32::from_bits(self.read_fixed32(field_number)?))
    }

    pub fn set_float(&mut self, field_number: u32, value: f32) {
        self.set_value(field_number, Value::Fixed32(value.to_bits()));
    }

    pub fn get_double_with_default(&self, field_number: u32) -> Result<f64, KernelError> {
        Ok(f64::from_bits(self.read_fixed64(field_number)?))
    }

    pub fn set_double(&mut self, field_number: u32, value: f64) {
        self.set_value(field_number, Value::Fixed64(value.to_bits()));
    }

    pub fn get_bytes_with_default(&self, field_number: u32) -> Result<Vec<u8>, KernelError> {
        Ok(self.read_delimited(field_number)?.into_owned())
    }

    pub fn set_bytes(&mut self, field_number: u32, value: &[u8]) {
        self.set_value(field_number, Value::Delimited(value.to_vec()));
    }

    pub fn get_string_with_default(&self, field_number: u32) -> Result<String, KernelError> {
        let bytes = self.read_delimited(field_number)?.into_owned();
        String::from_utf8(bytes).map_err(|_| KernelError::InvalidUtf8)
    }

    pub fn set_string(&mut self, field_number: u32, value: &str) {
        self.set_bytes(field_number, value.as_bytes());
    }

    // ---------------------------------------------------------------- messages

    /// Merges every occurrence of a message field into one kernel, or `None`
    /// when the field is absent.
    fn merged_message(
        field: &Field,
        field_number: u32,
        pivot: usize,
    ) -> Result<Option<Kernel>, KernelError> {
        if let [Value::Message(kernel)] = field.values.as_slice() {
            return Ok(Some(kernel.clone()));
        }
        if field.values.is_empty() {
            return Ok(None);
        }
        let mut merged = Vec::new();
        for value in &field.values {
            match value {
                Value::Delimited(bytes) => merged.extend_from_slice(bytes),
                Value::Message(kernel) => merged.extend_from_slice(&kernel.serialize()),
                _ => return Err(Self::mismatch(field_number, WireType::Delimited)),
            }
        }
        Kernel::from_bytes_with_pivot(&merged, pivot).map(Some)
    }

    /// Returns a copy of the embedded message's kernel, or `None` if unset.
    pub fn get_message_accessor_or_null(
        &self,
        field_number: u32,
        pivot: Option<usize>,
    ) -> Result<Option<Kernel>, KernelError> {
        match self.storage.get(field_number) {
            Some(field) => {
                Self::merged_message(field, field_number, pivot.unwrap_or(DEFAULT_PIVOT))
            }
            None => Ok(None),
        }
    }

    /// Decodes the embedded message with `decode`, or returns `None` if unset.
    pub fn get_message_or_null<T>(
        &self,
        field_number: u32,
        decode: impl FnOnce(Kernel) -> T,
        pivot: Option<usize>,
    ) -> Result<Option<T>, KernelError> {
        Ok(self
            .get_message_accessor_or_null(field_number, pivot)?
            .map(decode))
    }

    /// Decodes the embedded message with `decode`; an unset field decodes
    /// an empty kernel.
    pub fn get_message<T>(
        &self,
        field_number: u32,
        decode: impl FnOnce(Kernel) -> T,
        pivot: Option<usize>,
    ) -> Result<T, KernelError> {
        let kernel = self
            .get_message_accessor_or_null(field_number, pivot)?
            .unwrap_or_else(|| Kernel::with_pivot(pivot.unwrap_or(DEFAULT_PIVOT)));
        Ok(decode(kernel))
    }

    /// Get-or-create access to an embedded message.
    ///
    /// When the field is unset, `create` provides the initial message, which
    /// is stored right away. The stored kernel is then lent to `view` for as
    /// long as this kernel is mutably borrowed, so whatever `view` builds
    /// around it edits this kernel directly.
    pub fn get_message_attach<'a, T, M: InternalMessage>(
        &'a mut self,
        field_number: u32,
        view: impl FnOnce(&'a mut Kernel) -> T,
        create: impl FnOnce() -> M,
        pivot: Option<usize>,
    ) -> Result<T, KernelError> {
        let pivot = pivot.unwrap_or(DEFAULT_PIVOT);
        let field = self.storage.entry(field_number);
        if field.values.is_empty() {
            field.values.push(Value::Message(create().into_kernel()));
        }
        if !matches!(field.values.as_slice(), [Value::Message(_)]) {
            let merged = Self::merged_message(field, field_number, pivot)?
                .unwrap_or_else(|| Kernel::with_pivot(pivot));
            *field = Field::single(Value::Message(merged));
        }
        match field.values.as_mut_slice() {
            [Value::Message(kernel)] => Ok(view(kernel)),
            _ => Err(Self::mismatch(field_number, WireType::Delimited)),
        }
    }

    /// Stores `value` as the only occurrence of a message field.
    pub fn set_message<M: InternalMessage>(&mut self, field_number: u32, value: M) {
        self.set_value(field_number, Value::Message(value.into_kernel()));
    }

    // ---------------------------------------------------------------- repeated groups

    fn group_values(&self, field_number: u32) -> &[Value] {
        self.storage
            .get(field_number)
            .map(|field| field.values.as_slice())
            .unwrap_or(&[])
    }

    fn group_kernel(value: &Value, field_number: u32, pivot: usize) -> Result<Kernel, KernelError> {
        match value {
            Value::Group(contents) => Kernel::from_bytes_with_pivot(contents, pivot),
            Value::GroupMessage(kernel) => Ok(kernel.clone()),
            _ => Err(Self::mismatch(field_number, WireType::StartGroup)),
        }
    }

    /// Lazily decodes each element of a repeated group field.
    ///
    /// Every call starts a new traversal over the field's current elements.
    pub fn get_repeated_group_iterable<'a, T: 'a>(
        &'a self,
        field_number: u32,
        factory: impl Fn(Kernel) -> T + 'a,
    ) -> impl Iterator<Item = Result<T, KernelError>> + 'a {
        let pivot = self.pivot();
        self.group_values(field_number)
            .iter()
            .map(move |value| Self::group_kernel(value, field_number, pivot).map(&factory))
    }

    pub fn get_repeated_group_element<T>(
        &self,
        field_number: u32,
        factory: impl FnOnce(Kernel) -> T,
        index: usize,
    ) -> Result<T, KernelError> {
        let values = self.group_values(field_number);
        let value = values.get(index).ok_or(KernelError::IndexOutOfBounds {
            index,
            size: values.len(),
        })?;
        Self::group_kernel(value, field_number, self.pivot()).map(factory)
    }

    pub fn get_repeated_group_size(&self, field_number: u32) -> usize {
        self.group_values(field_number).len()
    }

    /// Parses one group element in place and lends it out mutably.
    pub fn get_repeated_group_element_mut(
        &mut self,
        field_number: u32,
        index: usize,
    ) -> Result<&mut Kernel, KernelError> {
        let pivot = self.pivot();
        let size = self.get_repeated_group_size(field_number);
        let value = self
            .storage
            .get_mut(field_number)
            .and_then(|field| field.values.get_mut(index))
            .ok_or(KernelError::IndexOutOfBounds { index, size })?;
        let parsed = match &*value {
            Value::Group(contents) => Some(Kernel::from_bytes_with_pivot(contents, pivot)?),
            _ => None,
        };
        if let Some(kernel) = parsed {
            *value = Value::GroupMessage(kernel);
        }
        match value {
            Value::GroupMessage(kernel) => Ok(kernel),
            _ => Err(Self::mismatch(field_number, WireType::StartGroup)),
        }
    }

    pub fn add_repeated_group_element<M: InternalMessage>(&mut self, field_number: u32, item: M) {
        self.storage
            .entry(field_number)
            .values
            .push(Value::GroupMessage(item.into_kernel()));
    }

    pub fn add_repeated_group_iterable<M: InternalMessage>(
        &mut self,
        field_number: u32,
        items: impl IntoIterator<Item = M>,
    ) {
        let values = &mut self.storage.entry(field_number).values;
        values.extend(items.into_iter().map(|item| Value::GroupMessage(item.into_kernel())));
    }

    /// Replaces every element of a repeated group field.
    pub fn set_repeated_group_iterable<M: InternalMessage>(
        &mut self,
        field_number: u32,
        items: impl IntoIterator<Item = M>,
    ) {
        let values: Vec<Value> = items
            .into_iter()
            .map(|item| Value::GroupMessage(item.into_kernel()))
            .collect();
        if values.is_empty() {
            self.storage.delete(field_number);
        } else {
            self.storage.set(field_number, Field { values });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_scalars_default_to_zero() {
        let kernel = Kernel::new();
        assert_eq!(kernel.get_int32_with_default(1), Ok(0));
        assert_eq!(kernel.get_bool_with_default(2), Ok(false));
        assert_eq!(kernel.get_double_with_default(3), Ok(0.0));
        assert_eq!(kernel.get_string_with_default(4), Ok(String::new()));
        assert!(!kernel.has_field_number(1));
    }

    #[test]
    fn last_scalar_occurrence_wins() {
        let kernel = Kernel::from_bytes(&[0x08, 0x01, 0x08, 0x02]).unwrap();
        assert_eq!(kernel.get_int32_with_default(1), Ok(2));
    }

    #[test]
    fn negative_int32_round_trips_through_ten_byte_varint() {
        let mut kernel = Kernel::new();
        kernel.set_int32(1, -5);
        let bytes = kernel.serialize();
        assert_eq!(bytes.len(), 11);
        let parsed = Kernel::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.get_int32_with_default(1), Ok(-5));
    }

    #[test]
    fn sint32_uses_zigzag() {
        let mut kernel = Kernel::new();
        kernel.set_sint32(1, -2);
        assert_eq!(kernel.serialize(), [0x08, 0x03]);
        assert_eq!(kernel.get_sint32_with_default(1), Ok(-2));
    }

    #[test]
    fn wire_type_mismatch_is_reported() {
        let mut kernel = Kernel::new();
        kernel.set_fixed32(1, 7);
        assert_eq!(
            kernel.get_int32_with_default(1),
            Err(KernelError::WireTypeMismatch {
                field_number: 1,
                expected: WireType::Varint
            })
        );
    }

    #[test]
    fn invalid_utf8_string() {
        let mut kernel = Kernel::new();
        kernel.set_bytes(1, &[0xff, 0xfe]);
        assert_eq!(kernel.get_string_with_default(1), Err(KernelError::InvalidUtf8));
    }

    #[test]
    fn message_occurrences_are_merged() {
        // field 1 = {2: 5}, field 1 = {3: 6}
        let kernel =
            Kernel::from_bytes(&[0x0a, 0x02, 0x10, 0x05, 0x0a, 0x02, 0x18, 0x06]).unwrap();
        let merged = kernel.get_message(1, |k| k, None).unwrap();
        assert_eq!(merged.get_int32_with_default(2), Ok(5));
        assert_eq!(merged.get_int32_with_default(3), Ok(6));
    }

    #[test]
    fn unset_message_decodes_empty() {
        let kernel = Kernel::new();
        let message = kernel.get_message(1, |k| k, None).unwrap();
        assert!(message.serialize().is_empty());
        assert!(kernel.get_message_or_null(1, |k| k, None).unwrap().is_none());
    }

    #[test]
    fn attach_edits_land_in_parent() {
        let mut parent = Kernel::new();
        let child = parent
            .get_message_attach(5, |k| k, Kernel::new, None)
            .unwrap();
        child.set_int32(1, 9);
        assert_eq!(parent.serialize(), [0x2a, 0x02, 0x08, 0x09]);
    }

    #[test]
    fn attach_parses_existing_payload_in_place() {
        let mut parent = Kernel::from_bytes(&[0x2a, 0x02, 0x08, 0x09]).unwrap();
        let child = parent
            .get_message_attach(5, |k| k, Kernel::new, None)
            .unwrap();
        assert_eq!(child.get_int32_with_default(1), Ok(9));
        child.set_int32(2, 1);
        assert_eq!(parent.serialize(), [0x2a, 0x04, 0x08, 0x09, 0x10, 0x01]);
    }

    #[test]
    fn group_element_out_of_bounds() {
        let kernel = Kernel::new();
        assert_eq!(
            kernel.get_repeated_group_element(1, |k| k, 0).unwrap_err(),
            KernelError::IndexOutOfBounds { index: 0, size: 0 }
        );
    }

    #[test]
    fn group_element_mut_edits_in_place() {
        let mut kernel =
            Kernel::from_bytes(&[0x0b, 0x10, 0x01, 0x0c, 0x0b, 0x10, 0x02, 0x0c]).unwrap();
        kernel
            .get_repeated_group_element_mut(1, 1)
            .unwrap()
            .set_int32(2, 3);
        assert_eq!(
            kernel.serialize(),
            [0x0b, 0x10, 0x01, 0x0c, 0x0b, 0x10, 0x03, 0x0c]
        );
    }

    #[test]
    fn empty_group_set_clears_field() {
        let mut kernel = Kernel::new();
        kernel.add_repeated_group_element(1, Kernel::new());
        assert!(kernel.has_field_number(1));
        kernel.set_repeated_group_iterable(1, Vec::<Kernel>::new());
        assert!(!kernel.has_field_number(1));
        assert_eq!(kernel.get_repeated_group_size(1), 0);
    }
}
