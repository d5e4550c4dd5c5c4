//! Listener handles and isolated invocation.
//!
//! A [`Listener`] is a cheap, cloneable handle around an `Arc<ListenerFn<T>>`.
//! Clones share identity, so the handle that was registered is the handle
//! that removes it: [`EventEmitter::remove`](crate::EventEmitter::remove)
//! compares handles by pointer, never by behaviour.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

/// Registration handle returned by [`EventEmitter::on`](crate::EventEmitter::on)
/// and [`EventEmitter::once`](crate::EventEmitter::once).
pub type ListenerId = u64;

/// What a listener returns. `Err` counts as a failed invocation.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Closure type for event listeners. Receives the full argument list of the
/// emission.
pub type ListenerFn<T> = dyn Fn(&[T]) -> ListenerResult + Send + Sync;

/// Shared handle to a listener callback.
pub struct Listener<T = Value> {
    callback: Arc<ListenerFn<T>>,
}

impl<T> Listener<T> {
    /// Wrap a fallible callback.
    pub fn new(callback: impl Fn(&[T]) -> ListenerResult + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Wrap a callback that cannot fail (other than by panicking).
    pub fn infallible(callback: impl Fn(&[T]) + Send + Sync + 'static) -> Self {
        Self::new(move |args| {
            callback(args);
            Ok(())
        })
    }

    /// `true` if both handles point at the same callback allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.callback, &b.callback)
    }

    /// Call the callback directly, without failure isolation.
    pub fn call(&self, args: &[T]) -> ListenerResult {
        (self.callback)(args)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for Listener<T> {}

impl<T> From<&Listener<T>> for Listener<T> {
    fn from(listener: &Listener<T>) -> Self {
        listener.clone()
    }
}

impl<T, F> From<F> for Listener<T>
where
    F: Fn(&[T]) -> ListenerResult + Send + Sync + 'static,
{
    fn from(callback: F) -> Self {
        Self::new(callback)
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Listener(<fn>)")
    }
}

/// Run `listener` with `args`, reducing any failure to its message.
///
/// With `catch_panics` set, a panic is caught and reported like an `Err`.
/// Otherwise it unwinds straight through.
pub(crate) fn invoke<T>(
    listener: &Listener<T>,
    args: &[T],
    catch_panics: bool,
) -> Result<(), String> {
    if !catch_panics {
        return listener.call(args).map_err(|e| e.to_string());
    }
    match catch_unwind(AssertUnwindSafe(|| listener.call(args))) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "listener panicked".to_string()
    }
}
