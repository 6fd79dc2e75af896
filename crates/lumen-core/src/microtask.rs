//! Microtask Queue
//!
//! A per-thread FIFO of deferred tasks, the Rust counterpart of the browser's
//! microtask queue. The component scheduler relies on it for "N triggers, one
//! render": triggers enqueue at most one task per component, and the task runs
//! once the current synchronous turn is over.
//!
//! ## Driving the queue
//!
//! The queue never runs by itself. Either:
//!
//! - install a driver with [`set_microtask_driver`] that arranges for
//!   [`flush_microtasks`] to be called at the end of the turn (in WASM this is
//!   typically `wasm_bindgen_futures::spawn_local`), or
//! - call [`flush_microtasks`] explicitly, which is what tests do.
//!
//! ```
//! use lumen_core::microtask::{flush_microtasks, queue_microtask};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let ran = Rc::new(Cell::new(false));
//! queue_microtask({
//! 	let ran = Rc::clone(&ran);
//! 	move || {
//! 		ran.set(true);
//! 		Ok(())
//! 	}
//! });
//!
//! assert!(!ran.get());
//! let report = flush_microtasks();
//! assert!(ran.get());
//! assert_eq!(report.tasks_run, 1);
//! ```

use core::cell::{Cell, RefCell};

extern crate alloc;
use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::config::current_config;

/// Error type returned by a failing microtask.
pub type TaskError = Box<dyn std::error::Error>;

type Task = Box<dyn FnOnce() -> Result<(), TaskError>>;
type Driver = Rc<dyn Fn()>;

struct MicrotaskQueue {
	tasks: RefCell<VecDeque<Task>>,
	flushing: Cell<bool>,
	driver: RefCell<Option<Driver>>,
}

impl MicrotaskQueue {
	fn new() -> Self {
		Self {
			tasks: RefCell::new(VecDeque::new()),
			flushing: Cell::new(false),
			driver: RefCell::new(None),
		}
	}
}

thread_local! {
	static QUEUE: MicrotaskQueue = MicrotaskQueue::new();
}

/// Outcome of one [`flush_microtasks`] call.
#[derive(Debug, Default)]
pub struct FlushReport {
	/// Number of tasks executed.
	pub tasks_run: usize,
	/// Errors returned by failing tasks, in execution order.
	pub errors: Vec<TaskError>,
	/// `true` when the per-flush cap stopped the flush with tasks still queued.
	pub truncated: bool,
}

impl FlushReport {
	/// Returns `true` when every task succeeded and the queue was drained.
	pub fn is_clean(&self) -> bool {
		self.errors.is_empty() && !self.truncated
	}
}

/// Enqueues `task` to run on the next flush.
pub fn queue_microtask<F>(task: F)
where
	F: FnOnce() -> Result<(), TaskError> + 'static,
{
	let driver = QUEUE.with(|queue| {
		let mut tasks = queue.tasks.borrow_mut();
		let was_empty = tasks.is_empty();
		tasks.push_back(Box::new(task));

		// A running flush picks the task up on its own.
		if was_empty && !queue.flushing.get() {
			queue.driver.borrow().clone()
		} else {
			None
		}
	});

	if let Some(driver) = driver {
		driver();
	}
}

/// Runs queued tasks until the queue is empty or the configured cap is hit.
///
/// Tasks queued while flushing run within the same flush. A nested call from
/// inside a task returns an empty report. When the cap leaves tasks queued,
/// the installed driver is called again so they get a turn of their own.
pub fn flush_microtasks() -> FlushReport {
	let mut report = FlushReport::default();

	let already_flushing = QUEUE.with(|queue| queue.flushing.replace(true));
	if already_flushing {
		return report;
	}

	let limit = current_config().max_microtasks_per_flush;
	loop {
		if report.tasks_run >= limit {
			report.truncated = QUEUE.with(|queue| !queue.tasks.borrow().is_empty());
			if report.truncated {
				tracing::warn!(
					limit,
					pending = pending_microtasks(),
					"microtask flush cap reached; remaining tasks stay queued"
				);
			}
			break;
		}

		let Some(task) = QUEUE.with(|queue| queue.tasks.borrow_mut().pop_front()) else {
			break;
		};
		report.tasks_run += 1;
		if let Err(error) = task() {
			tracing::error!(error = %error, "microtask failed");
			report.errors.push(error);
		}
	}

	QUEUE.with(|queue| queue.flushing.set(false));
	tracing::trace!(tasks_run = report.tasks_run, "microtask flush complete");

	// Leftover tasks keep the queue non-empty, so enqueueing won't wake the driver.
	if report.truncated {
		let driver = QUEUE.with(|queue| queue.driver.borrow().clone());
		if let Some(driver) = driver {
			driver();
		}
	}
	report
}

/// Number of tasks waiting in the queue.
pub fn pending_microtasks() -> usize {
	QUEUE.with(|queue| queue.tasks.borrow().len())
}

/// Installs the hook called when the queue goes from empty to non-empty.
///
/// The driver must not flush synchronously; it should schedule a flush for the
/// end of the current turn.
pub fn set_microtask_driver<F>(driver: F)
where
	F: Fn() + 'static,
{
	QUEUE.with(|queue| *queue.driver.borrow_mut() = Some(Rc::new(driver)));
}

/// Removes the driver installed by [`set_microtask_driver`].
pub fn clear_microtask_driver() {
	QUEUE.with(|queue| *queue.driver.borrow_mut() = None);
}
