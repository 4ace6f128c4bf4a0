//! One type-tagged entry of a [`MessageSet`](crate::MessageSet).

use proto_kernel::{InternalMessage, Kernel, KernelError};

use crate::{MESSAGE_FIELD_NUMBER, TYPE_ID_FIELD_NUMBER};

/// A type identifier bound to one embedded message.
///
/// On the wire an item is one group element: the type id at field 2, the
/// message at field 3.
#[derive(Debug, Clone, Default)]
pub struct Item {
    kernel: Kernel,
}

impl Item {
    pub fn create<M: InternalMessage>(type_id: i32, value: M) -> Self {
        let mut kernel = Kernel::new();
        kernel.set_int32(TYPE_ID_FIELD_NUMBER, type_id);
        kernel.set_message(MESSAGE_FIELD_NUMBER, value);
        Self { kernel }
    }

    pub fn from_kernel(kernel: Kernel) -> Self {
        Self { kernel }
    }

    /// Decodes the embedded message. An unset message decodes an empty kernel.
    pub fn message<T>(
        &self,
        decode: impl FnOnce(Kernel) -> T,
        pivot: Option<usize>,
    ) -> Result<T, KernelError> {
        self.kernel.get_message(MESSAGE_FIELD_NUMBER, decode, pivot)
    }

    /// Get-or-create access to the embedded message; `view` borrows the
    /// stored message mutably for as long as this item is borrowed.
    pub fn message_attach<'a, T, M: InternalMessage>(
        &'a mut self,
        view: impl FnOnce(&'a mut Kernel) -> T,
        create: impl FnOnce() -> M,
        pivot: Option<usize>,
    ) -> Result<T, KernelError> {
        Self::attach_in(&mut self.kernel, view, create, pivot)
    }

    /// Attach on an item kernel that lives inside a parent's storage.
    pub(crate) fn attach_in<'a, T, M: InternalMessage>(
        kernel: &'a mut Kernel,
        view: impl FnOnce(&'a mut Kernel) -> T,
        create: impl FnOnce() -> M,
        pivot: Option<usize>,
    ) -> Result<T, KernelError> {
        kernel.get_message_attach(MESSAGE_FIELD_NUMBER, view, create, pivot)
    }

    pub fn message_accessor_or_null(
        &self,
        pivot: Option<usize>,
    ) -> Result<Option<Kernel>, KernelError> {
        self.kernel.get_message_accessor_or_null(MESSAGE_FIELD_NUMBER, pivot)
    }

    pub fn set_message<M: InternalMessage>(&mut self, value: M) {
        self.kernel.set_message(MESSAGE_FIELD_NUMBER, value);
    }

    /// The type identifier, `0` when never written.
    pub fn type_id(&self) -> Result<i32, KernelError> {
        self.kernel.get_int32_with_default(TYPE_ID_FIELD_NUMBER)
    }
}

impl InternalMessage for Item {
    fn internal_get_kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn into_kernel(self) -> Kernel {
        self.kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_type_id_defaults_to_zero() {
        assert_eq!(Item::default().type_id(), Ok(0));
        assert_eq!(Item::from_kernel(Kernel::new()).type_id(), Ok(0));
    }

    #[test]
    fn create_writes_type_id_then_message() {
        let mut foo = Kernel::new();
        foo.set_int32(20, 30);
        let item = Item::create(12345, foo);
        assert_eq!(
            item.internal_get_kernel().serialize(),
            [0x10, 0xb9, 0x60, 0x1a, 0x03, 0xa0, 0x01, 0x1e]
        );
    }

    #[test]
    fn unset_message_is_null_but_decodes_empty() {
        let item = Item::default();
        assert!(item.message_accessor_or_null(None).unwrap().is_none());
        let message = item.message(|k| k, None).unwrap();
        assert!(message.serialize().is_empty());
    }

    #[test]
    fn message_attach_creates_and_shares_slot() {
        let mut item = Item::default();
        item.message_attach(|k| k, Kernel::new, None)
            .unwrap()
            .set_int32(1, 4);
        let message = item.message(|k| k, None).unwrap();
        assert_eq!(message.get_int32_with_default(1), Ok(4));
    }

    #[test]
    fn set_message_overwrites() {
        let mut first = Kernel::new();
        first.set_int32(1, 1);
        let mut second = Kernel::new();
        second.set_int32(1, 2);
        let mut item = Item::create(7, first);
        item.set_message(second);
        let message = item.message(|k| k, None).unwrap();
        assert_eq!(message.get_int32_with_default(1), Ok(2));
        assert_eq!(item.type_id(), Ok(7));
    }
}
