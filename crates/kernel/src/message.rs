use crate::Kernel;

/// A message type backed by a [`Kernel`].
///
/// This is the only capability the kernel needs from a message value: it
/// stores sub-messages by taking their kernel, and never needs to know their
/// concrete type. Reading goes the other way through caller-supplied decode
/// closures of shape `FnOnce(Kernel) -> T`.
pub trait InternalMessage {
    fn internal_get_kernel(&self) -> &Kernel;

    fn into_kernel(self) -> Kernel
    where
        Self: Sized;
}
