//! Named, synchronous event emitter.
//!
//! # Overview
//!
//! [`EventEmitter`] maps event names to ordered listener sequences. Listeners
//! are registered with [`on`](EventEmitter::on) or
//! [`once`](EventEmitter::once), fired in registration order by
//! [`emit`](EventEmitter::emit), and unregistered by handle identity
//! ([`remove`](EventEmitter::remove)), by registration id
//! ([`off`](EventEmitter::off)), or wholesale.
//!
//! # Modules
//!
//! - [`emitter`]: [`EventEmitter<T>`], the registry.
//! - [`listener`]: [`Listener<T>`] handles and [`ListenerId`].
//! - [`error`]: [`EmitError`], returned when listeners fail during `emit`.
//! - [`config`]: [`EmitterConfig`].

pub mod config;
pub mod emitter;
pub mod error;
pub mod listener;

pub use config::EmitterConfig;
pub use emitter::EventEmitter;
pub use error::{EmitError, ListenerFailure, Result};
pub use listener::{Listener, ListenerFn, ListenerId, ListenerResult};
