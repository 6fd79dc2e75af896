//! ComponentInstance - One live custom element running a definition
//!
//! An instance owns the state record and the [`ResourceManager`] of one host
//! element. Its lifecycle is:
//!
//! 1. [`ComponentInstance::new`]: seed state, run `constructed` and
//!    `resources` (both registered for disposal).
//! 2. [`ComponentInstance::mount`]: mark mounted and render synchronously.
//! 3. Updates through [`ComponentInstance::schedule_update`] (batched) or
//!    [`ComponentInstance::update_component`] (immediate).
//! 4. [`ComponentInstance::unmount`]: dispose every resource exactly once.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use lumen_core::{AggregateDisposeError, Injector, current_config};
use lumen_dom::{Element, ListenerId};

use crate::context::ComponentContext;
use crate::definition::ComponentDefinition;
use crate::error::{ComponentError, ComponentResult};
use crate::handle::InstanceHandle;
use crate::render_context::set_render_context;
use crate::resource_manager::ResourceManager;
use crate::scheduler::UpdatePhase;
use crate::state::StateRecord;

pub(crate) struct InstanceInner {
	pub(crate) definition: ComponentDefinition,
	pub(crate) host: Element,
	pub(crate) state: RefCell<StateRecord>,
	pub(crate) dirty_keys: RefCell<BTreeSet<String>>,
	/// Keys written while a render is in progress; they stay dirty for the
	/// follow-up render.
	pub(crate) render_writes: RefCell<BTreeSet<String>>,
	pub(crate) resources: ResourceManager,
	pub(crate) refs: RefCell<HashMap<String, Rc<dyn Any>>>,
	pub(crate) observable_slots: RefCell<HashMap<String, Rc<dyn Any>>>,
	pub(crate) host_listeners: RefCell<Vec<ListenerId>>,
	pub(crate) injector: Injector,
	pub(crate) owns_injector: bool,
	pub(crate) render_count: Cell<u64>,
	pub(crate) mounted: Cell<bool>,
	pub(crate) torn_down: Cell<bool>,
	pub(crate) update_scheduled: Cell<bool>,
	pub(crate) phase: Cell<UpdatePhase>,
}

/// A live component bound to one host element.
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct ComponentInstance {
	pub(crate) inner: Rc<InstanceInner>,
}

impl ComponentInstance {
	/// Creates an instance for `host`: seeds the state record and runs the
	/// `constructed` and `resources` callbacks.
	///
	/// The instance is not mounted yet; call [`ComponentInstance::mount`].
	/// When a callback fails, everything created so far is disposed before the
	/// error is returned.
	pub fn new(
		definition: &ComponentDefinition,
		host: &Element,
		injector: &Injector,
	) -> ComponentResult<Self> {
		let (injector, owns_injector) = if definition.has_scoped_injector() {
			(injector.create_child()?, true)
		} else {
			(injector.clone(), false)
		};

		let instance = Self {
			inner: Rc::new(InstanceInner {
				definition: definition.clone(),
				host: host.clone(),
				state: RefCell::new(StateRecord::new()),
				dirty_keys: RefCell::new(BTreeSet::new()),
				render_writes: RefCell::new(BTreeSet::new()),
				resources: ResourceManager::new(),
				refs: RefCell::new(HashMap::new()),
				observable_slots: RefCell::new(HashMap::new()),
				host_listeners: RefCell::new(Vec::new()),
				injector,
				owns_injector,
				render_count: Cell::new(0),
				mounted: Cell::new(false),
				torn_down: Cell::new(false),
				update_scheduled: Cell::new(false),
				phase: Cell::new(UpdatePhase::Idle),
			}),
		};

		if let Err(error) = instance.construct() {
			if let Err(cleanup) = instance.unmount() {
				tracing::error!(tag = instance.tag(), error = %cleanup, "cleanup after failed construction failed");
			}
			return Err(error);
		}
		Ok(instance)
	}

	fn construct(&self) -> ComponentResult<()> {
		let ctx = self.context();
		let definition = &self.inner.definition;

		let state = definition.initial_state(&ctx)?;
		*self.inner.state.borrow_mut() = state;

		if let Some(cleanup) = definition.constructed(&ctx)? {
			self.inner
				.resources
				.insert_disposable("__constructed", Rc::new(cleanup))?;
		}
		for (index, resource) in definition.resources(&ctx)?.into_iter().enumerate() {
			self.inner
				.resources
				.insert_disposable(&format!("__resource_{}", index), Rc::new(resource))?;
		}
		Ok(())
	}

	/// Marks the instance mounted and performs the first render synchronously.
	pub fn mount(&self) -> ComponentResult<()> {
		if self.inner.torn_down.get() {
			return Err(lumen_core::CoreError::AlreadyDisposed("ComponentInstance").into());
		}
		if self.inner.mounted.replace(true) {
			return Ok(());
		}
		tracing::debug!(tag = self.tag(), "component mounted");
		self.update_component()
	}

	/// Renders synchronously, regardless of any pending batched update.
	///
	/// Calling this from inside the same instance's render fails with
	/// [`ComponentError::ReentrantRender`]. On an unmounted instance it does
	/// nothing.
	pub fn update_component(&self) -> ComponentResult<()> {
		if !self.inner.mounted.get() {
			tracing::trace!(tag = self.tag(), "update on unmounted component ignored");
			return Ok(());
		}
		self.render_now()
	}

	pub(crate) fn render_now(&self) -> ComponentResult<()> {
		if self.inner.phase.get() == UpdatePhase::Rendering {
			return Err(ComponentError::ReentrantRender(self.tag().to_string()));
		}
		self.inner.phase.set(UpdatePhase::Rendering);
		self.inner.render_writes.borrow_mut().clear();

		let started = current_config().trace_renders.then(Instant::now);
		let result = {
			let _guard = set_render_context(&self.inner.resources);
			self.render_pass()
		};

		// A trigger that arrived while rendering is still queued.
		self.inner.phase.set(if self.inner.update_scheduled.get() {
			UpdatePhase::Scheduled
		} else {
			UpdatePhase::Idle
		});

		match &result {
			Ok(()) => {
				let written = std::mem::take(&mut *self.inner.render_writes.borrow_mut());
				*self.inner.dirty_keys.borrow_mut() = written;
				let count = self.inner.render_count.get() + 1;
				self.inner.render_count.set(count);
				if let Some(started) = started {
					tracing::debug!(
						tag = self.tag(),
						render_count = count,
						elapsed_us = started.elapsed().as_micros() as u64,
						"component rendered"
					);
				}
			}
			Err(error) => {
				tracing::error!(tag = self.tag(), error = %error, "component render failed");
			}
		}
		result
	}

	fn render_pass(&self) -> ComponentResult<()> {
		let ctx = self.context();
		let definition = &self.inner.definition;

		if let Some(changed) = definition.compare_state(&ctx) {
			if !changed? {
				tracing::trace!(tag = self.tag(), "compare_state skipped patch");
				return Ok(());
			}
		}
		let view = definition.render(&ctx)?;
		view.patch(&self.inner.host)?;
		Ok(())
	}

	/// Marks the instance unmounted and disposes its resources and scoped
	/// injector.
	///
	/// Pending batched updates become no-ops. Later calls do nothing.
	pub fn unmount(&self) -> ComponentResult<()> {
		if self.inner.torn_down.replace(true) {
			return Ok(());
		}
		self.inner.mounted.set(false);

		for id in self.inner.host_listeners.borrow_mut().drain(..) {
			self.inner.host.remove_event_listener(id);
		}
		self.inner.refs.borrow_mut().clear();
		self.inner.observable_slots.borrow_mut().clear();

		let mut errors = Vec::new();
		if let Err(err) = self.inner.resources.dispose() {
			errors.extend(err.errors().iter().cloned());
		}
		if self.inner.owns_injector {
			if let Err(err) = self.inner.injector.dispose_scope() {
				errors.extend(err.errors().iter().cloned());
			}
		}
		tracing::debug!(
			tag = self.tag(),
			failures = errors.len(),
			"component unmounted"
		);
		AggregateDisposeError::into_result(errors).map_err(Into::into)
	}

	pub(crate) fn context(&self) -> ComponentContext {
		ComponentContext::new(self.clone())
	}

	pub(crate) fn mark_dirty(&self, key: &str) {
		self.inner.dirty_keys.borrow_mut().insert(key.to_string());
		if self.inner.phase.get() == UpdatePhase::Rendering {
			self.inner.render_writes.borrow_mut().insert(key.to_string());
		}
	}

	/// Stores `value` under `key` and schedules a batched update.
	pub fn set_state<T: 'static>(&self, key: &str, value: T) {
		self.inner.state.borrow_mut().insert(key, value);
		self.mark_dirty(key);
		self.schedule_update();
	}

	/// Returns a clone of the state value under `key`.
	pub fn state<T: Clone + 'static>(&self, key: &str) -> ComponentResult<Option<T>> {
		self.inner.state.borrow().get(key)
	}

	/// Custom element tag name.
	pub fn tag(&self) -> &str {
		self.inner.definition.tag()
	}

	/// The host element.
	pub fn host(&self) -> &Element {
		&self.inner.host
	}

	/// The injector scope of this instance.
	pub fn injector(&self) -> &Injector {
		&self.inner.injector
	}

	/// The instance's resource manager.
	pub fn resource_manager(&self) -> &ResourceManager {
		&self.inner.resources
	}

	/// Number of completed renders.
	pub fn render_count(&self) -> u64 {
		self.inner.render_count.get()
	}

	/// Returns `true` between mount and unmount.
	pub fn is_mounted(&self) -> bool {
		self.inner.mounted.get()
	}

	/// State keys written since the last completed render, sorted.
	pub fn changed_keys(&self) -> Vec<String> {
		self.inner.dirty_keys.borrow().iter().cloned().collect()
	}

	/// A weak handle for code that must not keep the instance alive.
	pub fn handle(&self) -> InstanceHandle {
		InstanceHandle::new(Rc::downgrade(&self.inner))
	}

	/// Returns `true` if both handles refer to the same instance.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	pub(crate) fn from_weak(inner: &Weak<InstanceInner>) -> Option<Self> {
		inner.upgrade().map(|inner| Self { inner })
	}
}

impl fmt::Debug for ComponentInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentInstance")
			.field("tag", &self.tag())
			.field("render_count", &self.render_count())
			.field("mounted", &self.is_mounted())
			.field("phase", &self.inner.phase.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use lumen_core::{DisposeError, DisposeFn, flush_microtasks};
	use lumen_dom::Event;
	use rstest::rstest;
	use serial_test::serial;

	fn counter_definition() -> ComponentDefinition {
		ComponentDefinition::builder("x-counter")
			.render(|ctx| {
				let (count, set_count) = ctx.use_state("count", 0)?;
				ctx.use_host_props(crate::HostProps::new().on("click", move |_| {
					set_count.update(|count| count + 1)
				}))?;
				Ok(format!("count: {}", count))
			})
			.build()
			.unwrap()
	}

	fn mounted(definition: &ComponentDefinition) -> ComponentInstance {
		let instance =
			ComponentInstance::new(definition, &Element::new(definition.tag()), &Injector::new())
				.unwrap();
		instance.mount().unwrap();
		instance
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_mount_renders_synchronously() {
		let instance = mounted(&counter_definition());

		assert_eq!(instance.render_count(), 1);
		assert_eq!(instance.host().text_content(), "count: 0");
		flush_microtasks();
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_click_renders_after_flush() {
		let instance = mounted(&counter_definition());

		instance.host().dispatch_event(&Event::new("click"));
		instance.host().dispatch_event(&Event::new("click"));
		assert_eq!(instance.render_count(), 1);

		flush_microtasks();

		assert_eq!(instance.render_count(), 2);
		assert_eq!(instance.host().text_content(), "count: 2");
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_update_component_is_immediate() {
		let instance = mounted(&counter_definition());
		instance.set_state("count", 7);

		instance.update_component().unwrap();

		assert_eq!(instance.render_count(), 2);
		assert_eq!(instance.host().text_content(), "count: 7");
		flush_microtasks();
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_constructed_and_resources_disposed_on_unmount() {
		let disposed = Rc::new(RefCell::new(Vec::new()));
		let definition = ComponentDefinition::builder("x-res")
			.constructed({
				let disposed = Rc::clone(&disposed);
				move |_| {
					let disposed = Rc::clone(&disposed);
					Ok(Some(Box::new(DisposeFn::infallible(move || {
						disposed.borrow_mut().push("constructed")
					})) as Box<dyn lumen_core::Disposable>))
				}
			})
			.resources({
				let disposed = Rc::clone(&disposed);
				move |_| {
					let disposed = Rc::clone(&disposed);
					Ok(vec![Box::new(DisposeFn::infallible(move || {
						disposed.borrow_mut().push("resource")
					})) as Box<dyn lumen_core::Disposable>])
				}
			})
			.render(|_| Ok(crate::View::Empty))
			.build()
			.unwrap();
		let instance = mounted(&definition);

		instance.unmount().unwrap();
		instance.unmount().unwrap();

		assert_eq!(*disposed.borrow(), vec!["constructed", "resource"]);
		assert!(!instance.is_mounted());
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_unmount_reports_disposal_failures() {
		let definition = ComponentDefinition::builder("x-broken")
			.resources(|_| {
				Ok(vec![
					Box::new(DisposeFn::new(|| Err(DisposeError::new("first"))))
						as Box<dyn lumen_core::Disposable>,
					Box::new(DisposeFn::new(|| Err(DisposeError::new("second")))),
				])
			})
			.render(|_| Ok(crate::View::Empty))
			.build()
			.unwrap();
		let instance = mounted(&definition);

		let err = instance.unmount().unwrap_err();

		match err {
			ComponentError::Disposal(aggregate) => assert_eq!(aggregate.len(), 2),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_failed_construction_cleans_up() {
		let disposed = Rc::new(Cell::new(false));
		let definition = ComponentDefinition::builder("x-fails")
			.constructed({
				let disposed = Rc::clone(&disposed);
				move |_| {
					let disposed = Rc::clone(&disposed);
					Ok(Some(Box::new(DisposeFn::infallible(move || disposed.set(true)))
						as Box<dyn lumen_core::Disposable>))
				}
			})
			.resources(|_| Err(ComponentError::render("no backend")))
			.render(|_| Ok(crate::View::Empty))
			.build()
			.unwrap();

		let err = ComponentInstance::new(&definition, &Element::new("x-fails"), &Injector::new())
			.unwrap_err();

		assert_eq!(err, ComponentError::Render("no backend".to_string()));
		assert!(disposed.get());
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_scoped_injector_disposed_with_instance() {
		let root = Injector::new();
		let definition = ComponentDefinition::builder("x-scoped")
			.scoped_injector(true)
			.render(|_| Ok(crate::View::Empty))
			.build()
			.unwrap();
		let instance = ComponentInstance::new(&definition, &Element::new("x-scoped"), &root).unwrap();
		instance.mount().unwrap();

		assert!(instance.injector().parent().unwrap().ptr_eq(&root));
		instance.unmount().unwrap();

		assert!(instance.injector().is_disposed());
		assert!(!root.is_disposed());
	}
}
