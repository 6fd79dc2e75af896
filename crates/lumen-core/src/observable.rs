//! ObservableValue - Mutable Cell with Synchronous Change Notification
//!
//! `ObservableValue<T>` holds a value and a list of observers. Writing a value
//! that the configured comparer reports as changed notifies every observer
//! synchronously, in subscription order, before `set_value` returns.
//!
//! ## Key Properties
//!
//! - **Synchronous notification**: a caller that reads `get_value()` right after
//!   `set_value()` sees the new value and all observer side effects have run.
//! - **Comparer-gated**: the default comparer is `!=`; custom comparers decide
//!   what counts as a change.
//! - **Re-entrancy safe**: no borrow is held while observers run, so observers
//!   may read, write, subscribe or unsubscribe.
//! - **Explicit disposal**: after [`Disposable::dispose`] every access fails with
//!   [`CoreError::AlreadyDisposed`].
//!
//! ## Example
//!
//! ```
//! use lumen_core::ObservableValue;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let count = ObservableValue::new(0);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let _observer = count
//! 	.subscribe({
//! 		let seen = Rc::clone(&seen);
//! 		move |value: &i32| seen.borrow_mut().push(*value)
//! 	})
//! 	.unwrap();
//!
//! count.set_value(5).unwrap();
//! count.set_value(5).unwrap(); // unchanged, no notification
//! assert_eq!(*seen.borrow(), vec![5]);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

extern crate alloc;
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

use crate::disposable::{Disposable, DisposeError};
use crate::error::{CoreError, CoreResult};

/// Unique identity of an observable value.
///
/// Clones of an `ObservableValue` share the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservableId(usize);

impl ObservableId {
	fn next() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

type ObserverCallback<T> = Rc<dyn Fn(&T)>;
type Comparer<T> = Box<dyn Fn(&T, &T) -> bool>;

struct ObserverSlot<T> {
	id: u64,
	callback: ObserverCallback<T>,
}

struct ObservableInner<T> {
	id: ObservableId,
	value: RefCell<T>,
	observers: RefCell<Vec<ObserverSlot<T>>>,
	next_observer: Cell<u64>,
	disposed: Cell<bool>,
	changed: Comparer<T>,
}

impl<T> ObservableInner<T> {
	fn is_subscribed(&self, observer_id: u64) -> bool {
		self.observers
			.borrow()
			.iter()
			.any(|slot| slot.id == observer_id)
	}

	fn unsubscribe(&self, observer_id: u64) {
		self.observers
			.borrow_mut()
			.retain(|slot| slot.id != observer_id);
	}
}

/// A mutable value that notifies its observers when it changes.
///
/// `ObservableValue<T>` is a cheap handle: cloning it shares the value, the
/// observer list and the disposed flag.
pub struct ObservableValue<T: 'static> {
	inner: Rc<ObservableInner<T>>,
}

impl<T: Clone + 'static> ObservableValue<T> {
	/// Creates an observable using `!=` to detect changes.
	pub fn new(value: T) -> Self
	where
		T: PartialEq,
	{
		Self::with_comparer(value, |previous, next| previous != next)
	}

	/// Creates an observable with a custom change detector.
	///
	/// `changed(previous, next)` returns `true` when observers should be notified.
	pub fn with_comparer<F>(value: T, changed: F) -> Self
	where
		F: Fn(&T, &T) -> bool + 'static,
	{
		Self {
			inner: Rc::new(ObservableInner {
				id: ObservableId::next(),
				value: RefCell::new(value),
				observers: RefCell::new(Vec::new()),
				next_observer: Cell::new(0),
				disposed: Cell::new(false),
				changed: Box::new(changed),
			}),
		}
	}

	/// Returns a clone of the current value.
	pub fn get_value(&self) -> CoreResult<T> {
		self.ensure_alive()?;
		Ok(self.inner.value.borrow().clone())
	}

	/// Runs `f` with a reference to the current value.
	pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> CoreResult<R> {
		self.ensure_alive()?;
		Ok(f(&self.inner.value.borrow()))
	}

	/// Stores `next` and notifies observers if the comparer reports a change.
	pub fn set_value(&self, next: T) -> CoreResult<()> {
		self.ensure_alive()?;

		let changed = {
			let current = self.inner.value.borrow();
			(self.inner.changed)(&current, &next)
		};
		if !changed {
			return Ok(());
		}

		*self.inner.value.borrow_mut() = next.clone();
		self.notify(&next);
		Ok(())
	}

	/// Computes the next value from the current one and stores it.
	pub fn update(&self, f: impl FnOnce(&T) -> T) -> CoreResult<()> {
		let next = self.with_value(f)?;
		self.set_value(next)
	}

	/// Registers an observer that runs on every subsequent change.
	///
	/// The observer is not called with the current value.
	pub fn subscribe<F>(&self, callback: F) -> CoreResult<ValueObserver<T>>
	where
		F: Fn(&T) + 'static,
	{
		self.ensure_alive()?;

		let id = self.inner.next_observer.get();
		self.inner.next_observer.set(id + 1);
		self.inner.observers.borrow_mut().push(ObserverSlot {
			id,
			callback: Rc::new(callback),
		});

		Ok(ValueObserver {
			observable: Rc::downgrade(&self.inner),
			observable_id: self.inner.id,
			id,
			disposed: Cell::new(false),
		})
	}

	fn notify(&self, value: &T) {
		// Snapshot so observers can (un)subscribe while we iterate.
		let snapshot: Vec<(u64, ObserverCallback<T>)> = self
			.inner
			.observers
			.borrow()
			.iter()
			.map(|slot| (slot.id, Rc::clone(&slot.callback)))
			.collect();

		for (observer_id, callback) in snapshot {
			if self.inner.disposed.get() {
				break;
			}
			// Observers removed earlier in this pass are not called.
			if self.inner.is_subscribed(observer_id) {
				callback(value);
			}
		}
	}
}

impl<T: 'static> ObservableValue<T> {
	/// Identity shared by all clones of this observable.
	pub fn id(&self) -> ObservableId {
		self.inner.id
	}

	/// Returns `true` if both handles point to the same observable.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Number of live observers.
	pub fn observer_count(&self) -> usize {
		self.inner.observers.borrow().len()
	}

	/// Returns `true` after the observable has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}

	fn ensure_alive(&self) -> CoreResult<()> {
		if self.inner.disposed.get() {
			return Err(CoreError::AlreadyDisposed("ObservableValue"));
		}
		Ok(())
	}
}

impl<T: 'static> Clone for ObservableValue<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: 'static> Disposable for ObservableValue<T> {
	fn dispose(&self) -> Result<(), DisposeError> {
		self.inner.disposed.set(true);
		self.inner.observers.borrow_mut().clear();
		Ok(())
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableValue<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObservableValue")
			.field("id", &self.inner.id)
			.field("value", &self.inner.value.borrow())
			.field("observers", &self.observer_count())
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

/// Handle to one subscription on an [`ObservableValue`].
///
/// Disposing it unsubscribes the callback. Dropping it does not: the
/// subscription lives until it is disposed or the observable is disposed.
pub struct ValueObserver<T: 'static> {
	observable: Weak<ObservableInner<T>>,
	observable_id: ObservableId,
	id: u64,
	disposed: Cell<bool>,
}

impl<T: 'static> ValueObserver<T> {
	/// Identity of the observable this observer is attached to.
	pub fn observable_id(&self) -> ObservableId {
		self.observable_id
	}

	/// Returns `true` while the callback is still registered.
	pub fn is_active(&self) -> bool {
		!self.disposed.get()
			&& self
				.observable
				.upgrade()
				.is_some_and(|inner| inner.is_subscribed(self.id))
	}
}

impl<T: 'static> Disposable for ValueObserver<T> {
	fn dispose(&self) -> Result<(), DisposeError> {
		if self.disposed.replace(true) {
			return Ok(());
		}
		if let Some(inner) = self.observable.upgrade() {
			inner.unsubscribe(self.id);
		}
		Ok(())
	}
}

impl<T: 'static> fmt::Debug for ValueObserver<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValueObserver")
			.field("observable_id", &self.observable_id)
			.field("id", &self.id)
			.field("active", &self.is_active())
			.finish()
	}
}
