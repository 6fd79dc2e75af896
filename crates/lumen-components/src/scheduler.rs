//! Update Scheduler
//!
//! Per-instance state machine:
//!
//! ```text
//! Idle --trigger--> Scheduled --microtask--> Rendering --> Idle
//! Idle --update_component()--> Rendering --> Idle
//! ```
//!
//! Any number of [`ComponentInstance::schedule_update`] calls within one turn
//! queue a single microtask, which renders once after the turn ends. The task
//! holds only a weak reference and re-checks `is_mounted` right before
//! rendering, so updates that fire after unmount are dropped silently.

use std::rc::Rc;

use lumen_core::queue_microtask;

use crate::instance::ComponentInstance;

/// Where an instance is in its update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePhase {
	/// No update pending.
	#[default]
	Idle,
	/// A batched render is queued.
	Scheduled,
	/// A render is running.
	Rendering,
}

impl ComponentInstance {
	/// Requests a batched render.
	///
	/// Repeated calls before the queued render runs are coalesced. Calling this
	/// after unmount is allowed and does nothing.
	pub fn schedule_update(&self) {
		if self.inner.update_scheduled.replace(true) {
			tracing::trace!(tag = self.tag(), "update already scheduled");
			return;
		}
		if self.inner.phase.get() == UpdatePhase::Idle {
			self.inner.phase.set(UpdatePhase::Scheduled);
		}
		tracing::trace!(tag = self.tag(), "update scheduled");

		let weak = Rc::downgrade(&self.inner);
		queue_microtask(move || {
			let Some(instance) = ComponentInstance::from_weak(&weak) else {
				return Ok(());
			};
			instance.run_scheduled_update()?;
			Ok(())
		});
	}

	fn run_scheduled_update(&self) -> crate::ComponentResult<()> {
		self.inner.update_scheduled.set(false);
		if !self.inner.mounted.get() {
			if self.inner.phase.get() == UpdatePhase::Scheduled {
				self.inner.phase.set(UpdatePhase::Idle);
			}
			tracing::trace!(tag = self.tag(), "stale update dropped after unmount");
			return Ok(());
		}
		self.render_now()
	}

	/// Current phase of the update cycle.
	pub fn update_phase(&self) -> UpdatePhase {
		self.inner.phase.get()
	}

	/// Returns `true` while a batched render is queued.
	pub fn is_update_scheduled(&self) -> bool {
		self.inner.update_scheduled.get()
	}
}
