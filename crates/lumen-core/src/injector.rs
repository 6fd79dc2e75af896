//! Injector scopes
//!
//! A minimal, single-threaded service container: instances are cached per
//! scope by type, child scopes resolve through their ancestors before creating
//! anything themselves, and disposing a scope tears down the disposables
//! registered on it.

use core::any::{Any, TypeId};
use core::cell::{Cell, RefCell};
use core::fmt;

extern crate alloc;
use alloc::rc::Rc;
use alloc::vec::Vec;
use std::collections::HashMap;

use crate::disposable::{AggregateDisposeError, Disposable, DisposeError};
use crate::error::{CoreError, CoreResult};

struct InjectorInner {
	cache: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
	disposables: RefCell<Vec<Rc<dyn Disposable>>>,
	parent: Option<Injector>,
	disposed: Cell<bool>,
}

/// A service scope.
///
/// Cloning an `Injector` yields another handle to the same scope.
#[derive(Clone)]
pub struct Injector {
	inner: Rc<InjectorInner>,
}

impl Injector {
	/// Creates a root scope.
	pub fn new() -> Self {
		Self::with_parent(None)
	}

	fn with_parent(parent: Option<Injector>) -> Self {
		Self {
			inner: Rc::new(InjectorInner {
				cache: RefCell::new(HashMap::new()),
				disposables: RefCell::new(Vec::new()),
				parent,
				disposed: Cell::new(false),
			}),
		}
	}

	/// Returns the instance of `T` visible from this scope, creating and caching
	/// it in this scope if no ancestor already holds one.
	///
	/// # Examples
	///
	/// ```
	/// use lumen_core::Injector;
	/// use std::rc::Rc;
	///
	/// #[derive(Default)]
	/// struct Counter;
	///
	/// let injector = Injector::new();
	/// let first = injector.get_instance::<Counter>().unwrap();
	/// let second = injector.get_instance::<Counter>().unwrap();
	/// assert!(Rc::ptr_eq(&first, &second));
	/// ```
	pub fn get_instance<T: Default + 'static>(&self) -> CoreResult<Rc<T>> {
		self.ensure_alive()?;
		if let Some(existing) = self.lookup::<T>() {
			return Ok(existing);
		}

		let created = Rc::new(T::default());
		self.inner
			.cache
			.borrow_mut()
			.insert(TypeId::of::<T>(), created.clone() as Rc<dyn Any>);
		Ok(created)
	}

	/// Stores `value` as the instance of `T` for this scope and its children.
	pub fn set_explicit_instance<T: 'static>(&self, value: T) -> CoreResult<Rc<T>> {
		self.ensure_alive()?;
		let value = Rc::new(value);
		self.inner
			.cache
			.borrow_mut()
			.insert(TypeId::of::<T>(), value.clone() as Rc<dyn Any>);
		Ok(value)
	}

	/// Returns the cached instance of `T` without creating one.
	pub fn try_get<T: 'static>(&self) -> Option<Rc<T>> {
		if self.inner.disposed.get() {
			return None;
		}
		self.lookup::<T>()
	}

	fn lookup<T: 'static>(&self) -> Option<Rc<T>> {
		let local = self
			.inner
			.cache
			.borrow()
			.get(&TypeId::of::<T>())
			.cloned()
			.and_then(|any| any.downcast::<T>().ok());
		local.or_else(|| self.inner.parent.as_ref().and_then(Injector::lookup::<T>))
	}

	/// Creates a child scope that resolves through this one.
	pub fn create_child(&self) -> CoreResult<Injector> {
		self.ensure_alive()?;
		Ok(Self::with_parent(Some(self.clone())))
	}

	/// Registers a resource disposed together with this scope.
	pub fn register_disposable(&self, disposable: Rc<dyn Disposable>) -> CoreResult<()> {
		self.ensure_alive()?;
		self.inner.disposables.borrow_mut().push(disposable);
		Ok(())
	}

	/// Returns the parent scope, if any.
	pub fn parent(&self) -> Option<&Injector> {
		self.inner.parent.as_ref()
	}

	/// Returns `true` once the scope has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}

	/// Returns `true` if both handles refer to the same scope.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Tears down the scope, disposing every registered resource once.
	pub fn dispose_scope(&self) -> Result<(), AggregateDisposeError> {
		if self.inner.disposed.replace(true) {
			return Ok(());
		}
		let disposables = core::mem::take(&mut *self.inner.disposables.borrow_mut());
		self.inner.cache.borrow_mut().clear();

		let errors: Vec<DisposeError> = disposables
			.iter()
			.filter_map(|disposable| disposable.dispose().err())
			.collect();
		AggregateDisposeError::into_result(errors)
	}

	fn ensure_alive(&self) -> CoreResult<()> {
		if self.inner.disposed.get() {
			return Err(CoreError::AlreadyDisposed("Injector"));
		}
		Ok(())
	}
}

impl Default for Injector {
	fn default() -> Self {
		Self::new()
	}
}

impl Disposable for Injector {
	fn dispose(&self) -> Result<(), DisposeError> {
		self.dispose_scope()
			.map_err(|err| DisposeError::new(err.to_string()))
	}
}

impl fmt::Debug for Injector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Injector")
			.field("cached", &self.inner.cache.borrow().len())
			.field("has_parent", &self.inner.parent.is_some())
			.field("disposed", &self.inner.disposed.get())
			.finish()
	}
}
