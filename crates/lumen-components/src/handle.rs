//! Weak instance handles and async loaders.
//!
//! An [`InstanceHandle`] lets event handlers, timers and futures reach an
//! instance without keeping it alive. Async loaders use
//! [`InstanceHandle::resolve_into`]: after the awaited future completes, the
//! handle re-checks that the instance is still mounted and discards the result
//! otherwise, so a late response never writes into a detached element.

use std::fmt;
use std::future::Future;
use std::rc::Weak;

use crate::error::ComponentResult;
use crate::instance::{ComponentInstance, InstanceInner};

/// What happened to an async loader's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
	/// The result was stored and an update scheduled.
	Applied,
	/// The instance was unmounted or dropped before the future completed.
	Discarded,
}

impl LoadOutcome {
	/// Returns `true` for [`LoadOutcome::Applied`].
	pub fn is_applied(self) -> bool {
		self == Self::Applied
	}
}

/// A weak reference to a component instance.
#[derive(Clone)]
pub struct InstanceHandle {
	inner: Weak<InstanceInner>,
}

impl InstanceHandle {
	pub(crate) fn new(inner: Weak<InstanceInner>) -> Self {
		Self { inner }
	}

	/// The instance, if it still exists.
	pub fn upgrade(&self) -> Option<ComponentInstance> {
		ComponentInstance::from_weak(&self.inner)
	}

	/// Returns `true` while the instance exists and is mounted.
	pub fn is_mounted(&self) -> bool {
		self.upgrade().is_some_and(|instance| instance.is_mounted())
	}

	/// Requests a batched render; does nothing once the instance is gone.
	pub fn schedule_update(&self) {
		if let Some(instance) = self.upgrade() {
			instance.schedule_update();
		}
	}

	/// Renders immediately; does nothing once the instance is gone.
	pub fn update_component(&self) -> ComponentResult<()> {
		match self.upgrade() {
			Some(instance) => instance.update_component(),
			None => Ok(()),
		}
	}

	/// Stores `value` under `key` and schedules a batched render.
	///
	/// Returns `false` when the instance is gone.
	pub fn set_state<T: 'static>(&self, key: &str, value: T) -> bool {
		match self.upgrade() {
			Some(instance) => {
				instance.set_state(key, value);
				true
			}
			None => false,
		}
	}

	/// Awaits `future` and stores its output under `key`, unless the instance
	/// was unmounted in the meantime.
	pub async fn resolve_into<T, F>(&self, key: &str, future: F) -> LoadOutcome
	where
		T: 'static,
		F: Future<Output = T>,
	{
		let value = future.await;
		match self.upgrade() {
			Some(instance) if instance.is_mounted() => {
				instance.set_state(key, value);
				LoadOutcome::Applied
			}
			_ => {
				tracing::debug!(key, "async result discarded after unmount");
				LoadOutcome::Discarded
			}
		}
	}
}

impl fmt::Debug for InstanceHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InstanceHandle")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}
