//! Ordered, type-tagged container of embedded messages.

use proto_kernel::{InternalMessage, Kernel, KernelError};

use crate::{Item, ITEM_FIELD_NUMBER};

/// An ordered sequence of [`Item`]s keyed by type identifier.
///
/// Items are stored as a repeated group at field 1 of the set's own kernel,
/// in insertion order. Nothing stops two items from sharing a type id; when
/// they do, lookups resolve to the item appended last, which matches how
/// wire data from several sources merges when concatenated.
///
/// # Example
///
/// ```
/// use proto_kernel::Kernel;
/// use proto_kernel_message_set::{Item, MessageSet};
///
/// let mut foo = Kernel::new();
/// foo.set_int32(20, 30);
///
/// let mut set = MessageSet::new();
/// set.add_item(Item::create(12345, foo));
///
/// let found = set.message_or_null(12345, |k| k, None).unwrap().unwrap();
/// assert_eq!(found.get_int32_with_default(20), Ok(30));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageSet {
    kernel: Kernel,
}

impl MessageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing kernel without copying or validating it. Malformed
    /// items only surface as errors once they are read.
    pub fn from_kernel(kernel: Kernel) -> Self {
        Self { kernel }
    }

    /// Iterates the items in encoding order.
    ///
    /// Each call starts an independent traversal over the current contents.
    pub fn items(&self) -> impl Iterator<Item = Result<Item, KernelError>> + '_ {
        self.kernel
            .get_repeated_group_iterable(ITEM_FIELD_NUMBER, Item::from_kernel)
    }

    pub fn item_at(&self, index: usize) -> Result<Item, KernelError> {
        self.kernel
            .get_repeated_group_element(ITEM_FIELD_NUMBER, Item::from_kernel, index)
    }

    pub fn item_count(&self) -> usize {
        self.kernel.get_repeated_group_size(ITEM_FIELD_NUMBER)
    }

    pub fn add_item(&mut self, item: Item) {
        self.kernel.add_repeated_group_element(ITEM_FIELD_NUMBER, item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = Item>) {
        self.kernel.add_repeated_group_iterable(ITEM_FIELD_NUMBER, items);
    }

    /// Replaces the whole item sequence.
    pub fn set_items(&mut self, items: impl IntoIterator<Item = Item>) {
        self.kernel.set_repeated_group_iterable(ITEM_FIELD_NUMBER, items);
    }

    /// Returns `true` if any item carries `type_id`. Stops at the first match.
    pub fn has_message(&self, type_id: i32) -> Result<bool, KernelError> {
        for item in self.items() {
            if item?.type_id()? == type_id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Decodes the message of the last item carrying `type_id`.
    ///
    /// Every match is decoded in turn and overwrites the previous result.
    pub fn message_or_null<T>(
        &self,
        type_id: i32,
        mut decode: impl FnMut(Kernel) -> T,
        pivot: Option<usize>,
    ) -> Result<Option<T>, KernelError> {
        let mut message = None;
        for item in self.items() {
            let item = item?;
            if item.type_id()? == type_id {
                message = Some(item.message(&mut decode, pivot)?);
            }
        }
        Ok(message)
    }

    /// The kernel of the last item carrying `type_id` with a message set.
    pub fn message_accessor_or_null(&self, type_id: i32) -> Result<Option<Kernel>, KernelError> {
        Ok(self.message_accessors(type_id)?.pop())
    }

    /// Kernels of every item carrying `type_id`, in encoding order. Items
    /// whose message was never set are skipped.
    pub fn message_accessors(&self, type_id: i32) -> Result<Vec<Kernel>, KernelError> {
        let mut accessors = Vec::new();
        for item in self.items() {
            let item = item?;
            if item.type_id()? != type_id {
                continue;
            }
            if let Some(accessor) = item.message_accessor_or_null(None)? {
                accessors.push(accessor);
            }
        }
        Ok(accessors)
    }

    /// Get-or-create access to the message for `type_id`.
    ///
    /// If an item with `type_id` exists, the message slot of the last such
    /// item is used. Otherwise `create` builds the message and a new item
    /// holding it is appended. Either way the slot is parsed in place and
    /// lent to `view` for as long as the set is mutably borrowed: mutating
    /// the returned value mutates the set, with no further write call.
    pub fn message_attach<'a, T, M: InternalMessage>(
        &'a mut self,
        type_id: i32,
        view: impl FnOnce(&'a mut Kernel) -> T,
        create: impl FnOnce() -> M,
        pivot: Option<usize>,
    ) -> Result<T, KernelError> {
        let index = match self.last_index_of(type_id)? {
            Some(index) => index,
            None => {
                tracing::trace!(type_id, "appending message set item on attach");
                self.add_item(Item::create(type_id, create()));
                self.item_count() - 1
            }
        };
        let entry = self
            .kernel
            .get_repeated_group_element_mut(ITEM_FIELD_NUMBER, index)?;
        Item::attach_in(entry, view, Kernel::new, pivot)
    }

    fn last_index_of(&self, type_id: i32) -> Result<Option<usize>, KernelError> {
        let mut last = None;
        for (index, item) in self.items().enumerate() {
            if item?.type_id()? == type_id {
                last = Some(index);
            }
        }
        Ok(last)
    }

    /// Removes every item carrying `type_id`, then appends one holding
    /// `message` if given. Passing `None` just deletes.
    pub fn set_item<M: InternalMessage>(
        &mut self,
        type_id: i32,
        message: Option<M>,
    ) -> Result<(), KernelError> {
        let mut items = Vec::new();
        for item in self.items() {
            let item = item?;
            if item.type_id()? != type_id {
                items.push(item);
            }
        }
        if let Some(message) = message {
            items.push(Item::create(type_id, message));
        }
        self.set_items(items);
        Ok(())
    }
}

impl InternalMessage for MessageSet {
    fn internal_get_kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn into_kernel(self) -> Kernel {
        self.kernel
    }
}
