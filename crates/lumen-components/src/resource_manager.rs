//! ResourceManager - Per-instance registry of keyed disposables
//!
//! Every component instance owns one `ResourceManager`. Hooks and reactive
//! bindings register their subscriptions and cleanups here, and unmounting the
//! instance disposes all of them in insertion order.
//!
//! ## Key rules
//!
//! - At most one live resource per key.
//! - [`ResourceManager::use_disposable`] calls its factory only on the first
//!   call for a key; later calls return the cached resource.
//! - [`ResourceManager::use_disposable_with`] additionally stores an identity
//!   value. When a later call passes a different identity, the old resource is
//!   disposed before the factory builds its replacement.
//! - [`ResourceManager::dispose`] is idempotent and keeps going after a failing
//!   entry; all failures are returned together.
//!
//! ## Example
//!
//! ```
//! use lumen_components::ResourceManager;
//! use lumen_core::DisposeFn;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let disposed = Rc::new(Cell::new(0));
//! let manager = ResourceManager::new();
//! manager
//! 	.use_disposable("timer", || {
//! 		let disposed = Rc::clone(&disposed);
//! 		Rc::new(DisposeFn::infallible(move || disposed.set(disposed.get() + 1)))
//! 	})
//! 	.unwrap();
//!
//! manager.dispose().unwrap();
//! manager.dispose().unwrap();
//! assert_eq!(disposed.get(), 1);
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use lumen_core::{AggregateDisposeError, CoreError, Disposable, DisposeError};

use crate::error::{ComponentError, ComponentResult};

struct Entry {
	key: String,
	identity: Option<Rc<dyn Any>>,
	value: Rc<dyn Any>,
	disposable: Rc<dyn Disposable>,
}

struct ManagerInner {
	entries: RefCell<Vec<Entry>>,
	disposed: Cell<bool>,
}

/// Keyed registry of disposables owned by one component instance.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct ResourceManager {
	inner: Rc<ManagerInner>,
}

fn next_binding_key() -> String {
	static COUNTER: AtomicU64 = AtomicU64::new(0);
	format!("__binding_{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

impl ResourceManager {
	/// Creates an empty manager.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(ManagerInner {
				entries: RefCell::new(Vec::new()),
				disposed: Cell::new(false),
			}),
		}
	}

	/// Returns the resource stored under `key`, creating it with `factory` on
	/// the first call.
	pub fn use_disposable<T, F>(&self, key: &str, factory: F) -> ComponentResult<T>
	where
		T: Disposable + Clone + 'static,
		F: FnOnce() -> T,
	{
		self.get_or_create(key, None::<()>, || Ok(factory()))
	}

	/// Like [`ResourceManager::use_disposable`], but recreates the resource
	/// whenever `identity` differs from the value stored with it.
	///
	/// The previous resource is disposed before `factory` runs.
	pub fn use_disposable_with<T, D, F>(&self, key: &str, identity: D, factory: F) -> ComponentResult<T>
	where
		T: Disposable + Clone + 'static,
		D: PartialEq + 'static,
		F: FnOnce() -> T,
	{
		self.get_or_create(key, Some(identity), || Ok(factory()))
	}

	/// Fallible form of [`ResourceManager::use_disposable_with`].
	pub fn try_use_disposable_with<T, D, F>(
		&self,
		key: &str,
		identity: D,
		factory: F,
	) -> ComponentResult<T>
	where
		T: Disposable + Clone + 'static,
		D: PartialEq + 'static,
		F: FnOnce() -> ComponentResult<T>,
	{
		self.get_or_create(key, Some(identity), factory)
	}

	fn get_or_create<T, D, F>(&self, key: &str, identity: Option<D>, factory: F) -> ComponentResult<T>
	where
		T: Disposable + Clone + 'static,
		D: PartialEq + 'static,
		F: FnOnce() -> ComponentResult<T>,
	{
		self.ensure_alive()?;

		let stale = {
			let mut entries = self.inner.entries.borrow_mut();
			match entries.iter().position(|entry| entry.key == key) {
				Some(index) => {
					let entry = &entries[index];
					let same_identity = match (&identity, &entry.identity) {
						(None, _) => true,
						(Some(next), Some(stored)) => stored
							.downcast_ref::<D>()
							.is_some_and(|stored| stored == next),
						(Some(_), None) => false,
					};
					if same_identity {
						return entry
							.value
							.downcast_ref::<T>()
							.cloned()
							.ok_or_else(|| ComponentError::type_mismatch::<T>(key));
					}
					Some(entries.remove(index))
				}
				None => None,
			}
		};

		// Old resource goes first so at most one is live per key.
		if let Some(stale) = stale {
			tracing::trace!(key, "replacing resource");
			if let Err(error) = stale.disposable.dispose() {
				tracing::error!(key, error = %error, "failed to dispose replaced resource");
				return Err(AggregateDisposeError::new(vec![error]).into());
			}
		}

		let resource = factory()?;
		self.ensure_alive()?;
		self.insert(Entry {
			key: key.to_string(),
			identity: identity.map(|identity| Rc::new(identity) as Rc<dyn Any>),
			value: Rc::new(resource.clone()),
			disposable: Rc::new(resource.clone()),
		});
		Ok(resource)
	}

	/// Registers `disposable` under a fresh synthetic key and returns the key.
	pub fn track(&self, disposable: Rc<dyn Disposable>) -> ComponentResult<String> {
		self.ensure_alive()?;
		let key = next_binding_key();
		self.insert(Entry {
			key: key.clone(),
			identity: None,
			value: Rc::new(()),
			disposable,
		});
		Ok(key)
	}

	/// Registers `disposable` under `key`, disposing any resource already
	/// stored there.
	pub fn insert_disposable(&self, key: &str, disposable: Rc<dyn Disposable>) -> ComponentResult<()> {
		self.ensure_alive()?;
		if let Err(error) = self.dispose_key(key) {
			return Err(AggregateDisposeError::new(vec![error]).into());
		}
		self.insert(Entry {
			key: key.to_string(),
			identity: None,
			value: Rc::new(()),
			disposable,
		});
		Ok(())
	}

	fn insert(&self, entry: Entry) {
		self.inner.entries.borrow_mut().push(entry);
	}

	/// Disposes and removes the resource stored under `key`.
	///
	/// Returns `Ok(false)` when nothing was stored there.
	pub fn dispose_key(&self, key: &str) -> Result<bool, DisposeError> {
		let removed = {
			let mut entries = self.inner.entries.borrow_mut();
			entries
				.iter()
				.position(|entry| entry.key == key)
				.map(|index| entries.remove(index))
		};
		match removed {
			Some(entry) => entry.disposable.dispose().map(|()| true),
			None => Ok(false),
		}
	}

	/// Returns `true` if a resource is stored under `key`.
	pub fn contains(&self, key: &str) -> bool {
		self.inner
			.entries
			.borrow()
			.iter()
			.any(|entry| entry.key == key)
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> Vec<String> {
		self.inner
			.entries
			.borrow()
			.iter()
			.map(|entry| entry.key.clone())
			.collect()
	}

	/// Number of live resources.
	pub fn len(&self) -> usize {
		self.inner.entries.borrow().len()
	}

	/// Returns `true` when no resource is stored.
	pub fn is_empty(&self) -> bool {
		self.inner.entries.borrow().is_empty()
	}

	/// Returns `true` once [`ResourceManager::dispose`] has run.
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}

	/// Returns `true` if both handles refer to the same manager.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Disposes every resource once, in insertion order.
	///
	/// A failing entry does not stop the others; all failures are returned.
	/// Later calls are no-ops.
	pub fn dispose(&self) -> Result<(), AggregateDisposeError> {
		if self.inner.disposed.replace(true) {
			return Ok(());
		}
		let entries = std::mem::take(&mut *self.inner.entries.borrow_mut());

		let mut errors = Vec::new();
		for entry in entries {
			if let Err(error) = entry.disposable.dispose() {
				tracing::error!(key = %entry.key, error = %error, "resource failed to dispose");
				errors.push(error);
			}
		}
		AggregateDisposeError::into_result(errors)
	}

	fn ensure_alive(&self) -> ComponentResult<()> {
		if self.inner.disposed.get() {
			return Err(CoreError::AlreadyDisposed("ResourceManager").into());
		}
		Ok(())
	}
}

impl Default for ResourceManager {
	fn default() -> Self {
		Self::new()
	}
}

impl Disposable for ResourceManager {
	fn dispose(&self) -> Result<(), DisposeError> {
		ResourceManager::dispose(self).map_err(|err| DisposeError::new(err.to_string()))
	}
}

impl fmt::Debug for ResourceManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResourceManager")
			.field("keys", &self.keys())
			.field("disposed", &self.is_disposed())
			.finish()
	}
}
