//! Lumen Core - Primitives for the lumen component runtime
//!
//! This crate holds the pieces of the runtime that know nothing about DOM or
//! components:
//!
//! - [`disposable`]: the explicit teardown contract shared by every resource
//! - [`observable`]: `ObservableValue<T>`, a mutable cell with synchronous,
//!   comparer-gated change notification
//! - [`microtask`]: the per-thread deferred task queue used for update batching
//! - [`injector`]: type-keyed service scopes with child scopes and teardown
//! - [`config`]: runtime tunables loaded from TOML
//!
//! Everything is single-threaded: handles are `Rc`-based and per-thread state
//! lives in thread-local storage, which in WASM is simply global.

#![warn(missing_docs)]

pub mod config;
pub mod disposable;
pub mod error;
pub mod injector;
pub mod microtask;
pub mod observable;

pub use config::{RuntimeConfig, configure, current_config};
pub use disposable::{AggregateDisposeError, Disposable, DisposeError, DisposeFn};
pub use error::{CoreError, CoreResult};
pub use injector::Injector;
pub use microtask::{
	FlushReport, TaskError, clear_microtask_driver, flush_microtasks, pending_microtasks,
	queue_microtask, set_microtask_driver,
};
pub use observable::{ObservableId, ObservableValue, ValueObserver};
