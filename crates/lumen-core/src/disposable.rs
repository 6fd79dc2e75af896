//! Disposable - Explicit Teardown Contract
//!
//! Every resource the runtime tracks (observable subscriptions, DOM bindings,
//! lifecycle cleanups, injector scopes) implements [`Disposable`]. Teardown is
//! explicit and fallible: a failing cleanup reports a [`DisposeError`] instead of
//! panicking, so that owners such as the resource manager can keep disposing the
//! remaining entries and report every failure together.
//!
//! ## Example
//!
//! ```
//! use lumen_core::{Disposable, DisposeFn};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let calls = Rc::new(Cell::new(0));
//! let cleanup = DisposeFn::new({
//! 	let calls = Rc::clone(&calls);
//! 	move || {
//! 		calls.set(calls.get() + 1);
//! 		Ok(())
//! 	}
//! });
//!
//! cleanup.dispose().unwrap();
//! cleanup.dispose().unwrap();
//! assert_eq!(calls.get(), 1);
//! ```

use core::cell::RefCell;
use core::fmt;

extern crate alloc;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

/// A resource with an explicit, fallible teardown.
///
/// Implementations must tolerate repeated calls: the second and later calls
/// are expected to be no-ops returning `Ok(())`.
pub trait Disposable {
	/// Releases the resource.
	fn dispose(&self) -> Result<(), DisposeError>;
}

impl<T: Disposable + ?Sized> Disposable for Rc<T> {
	fn dispose(&self) -> Result<(), DisposeError> {
		(**self).dispose()
	}
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
	fn dispose(&self) -> Result<(), DisposeError> {
		(**self).dispose()
	}
}

/// Failure of a single resource's cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DisposeError {
	message: String,
}

impl DisposeError {
	/// Creates a new disposal error with the given message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	/// Returns the error message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

/// All failures collected while disposing a group of resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct AggregateDisposeError {
	errors: Vec<DisposeError>,
}

impl AggregateDisposeError {
	/// Wraps the collected failures.
	pub fn new(errors: Vec<DisposeError>) -> Self {
		Self { errors }
	}

	/// Returns the individual failures in disposal order.
	pub fn errors(&self) -> &[DisposeError] {
		&self.errors
	}

	/// Number of resources that failed to dispose.
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	/// Returns `true` when no failure was collected.
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// Converts collected failures into a result, `Ok` when there are none.
	pub fn into_result(errors: Vec<DisposeError>) -> Result<(), Self> {
		if errors.is_empty() {
			Ok(())
		} else {
			Err(Self::new(errors))
		}
	}
}

impl fmt::Display for AggregateDisposeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} resource(s) failed to dispose", self.errors.len())?;
		for error in &self.errors {
			write!(f, "; {}", error)?;
		}
		Ok(())
	}
}

type DisposeCallback = Box<dyn FnOnce() -> Result<(), DisposeError>>;

/// A disposable built from a closure.
///
/// The closure runs on the first `dispose()` call only.
pub struct DisposeFn {
	callback: RefCell<Option<DisposeCallback>>,
}

impl DisposeFn {
	/// Wraps a fallible cleanup closure.
	pub fn new<F>(f: F) -> Self
	where
		F: FnOnce() -> Result<(), DisposeError> + 'static,
	{
		Self {
			callback: RefCell::new(Some(Box::new(f))),
		}
	}

	/// Wraps a cleanup closure that cannot fail.
	pub fn infallible<F>(f: F) -> Self
	where
		F: FnOnce() + 'static,
	{
		Self::new(move || {
			f();
			Ok(())
		})
	}

	/// Returns `true` once the closure has run.
	pub fn is_disposed(&self) -> bool {
		self.callback.borrow().is_none()
	}
}

impl Disposable for DisposeFn {
	fn dispose(&self) -> Result<(), DisposeError> {
		// Take the closure before running it so a re-entrant dispose is a no-op.
		let callback = self.callback.borrow_mut().take();
		match callback {
			Some(callback) => callback(),
			None => Ok(()),
		}
	}
}

impl fmt::Debug for DisposeFn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DisposeFn")
			.field("disposed", &self.is_disposed())
			.finish()
	}
}
