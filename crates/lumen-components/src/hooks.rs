//! Hooks
//!
//! Per-instance state and resource accessors, available as methods on
//! [`ComponentContext`]. Every hook is identified by a string key that must be
//! stable across renders; hooks are matched by key, not by call order, so
//! conditional hook calls are fine.
//!
//! | Hook | Purpose |
//! |------|---------|
//! | [`use_state`](ComponentContext::use_state) | keyed state with a batched setter |
//! | [`use_observable`](ComponentContext::use_observable) | subscribe to an `ObservableValue` for the lifetime of the instance |
//! | [`use_disposable`](ComponentContext::use_disposable) | keyed resource disposed on unmount |
//! | [`use_ref`](ComponentContext::use_ref) | stable mutable slot, not reactive |
//! | [`use_host_props`](ComponentContext::use_host_props) | attributes, styles, properties and listeners on the host |

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use lumen_core::{CoreResult, Disposable, ObservableValue};

use crate::context::ComponentContext;
use crate::error::{ComponentError, ComponentResult};
use crate::host_props::HostProps;
use crate::instance::{ComponentInstance, InstanceInner};

/// Setter returned by [`ComponentContext::use_state`].
///
/// Holds the instance weakly; once the instance is gone, calls do nothing.
pub struct StateSetter<T> {
	instance: Weak<InstanceInner>,
	key: String,
	_marker: PhantomData<fn(T)>,
}

impl<T: Clone + 'static> StateSetter<T> {
	/// Stores `value` and schedules a batched render.
	pub fn set(&self, value: T) {
		if let Some(instance) = ComponentInstance::from_weak(&self.instance) {
			instance.set_state(&self.key, value);
		}
	}

	/// Computes the next value from the stored one and stores it.
	pub fn update(&self, f: impl FnOnce(&T) -> T) {
		let Some(instance) = ComponentInstance::from_weak(&self.instance) else {
			return;
		};
		match instance.state::<T>(&self.key) {
			Ok(Some(current)) => instance.set_state(&self.key, f(&current)),
			Ok(None) => {
				tracing::warn!(key = %self.key, "state update on a key with no value ignored");
			}
			Err(error) => {
				tracing::warn!(key = %self.key, error = %error, "state update ignored");
			}
		}
	}

	/// The state key.
	pub fn key(&self) -> &str {
		&self.key
	}
}

impl<T> Clone for StateSetter<T> {
	fn clone(&self) -> Self {
		Self {
			instance: Weak::clone(&self.instance),
			key: self.key.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T> fmt::Debug for StateSetter<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StateSetter").field("key", &self.key).finish()
	}
}

/// Options for [`ComponentContext::use_observable`].
pub struct UseObservableOptions<T> {
	on_change: Option<Rc<dyn Fn(&T)>>,
	render: bool,
}

impl<T> UseObservableOptions<T> {
	/// Default options: no side effect, re-render on change.
	pub fn new() -> Self {
		Self {
			on_change: None,
			render: true,
		}
	}

	/// Runs `f` with every new value, before any re-render is scheduled.
	pub fn on_change<F>(mut self, f: F) -> Self
	where
		F: Fn(&T) + 'static,
	{
		self.on_change = Some(Rc::new(f));
		self
	}

	/// Whether a change schedules a re-render. With `false` only the
	/// `on_change` side effect runs.
	pub fn render(mut self, render: bool) -> Self {
		self.render = render;
		self
	}
}

impl<T> Default for UseObservableOptions<T> {
	fn default() -> Self {
		Self::new()
	}
}

/// Setter returned by [`ComponentContext::use_observable`]; forwards to the
/// observable.
pub struct ObservableSetter<T: 'static> {
	observable: ObservableValue<T>,
}

impl<T: Clone + 'static> ObservableSetter<T> {
	/// Calls `set_value` on the observable.
	pub fn set(&self, value: T) -> CoreResult<()> {
		self.observable.set_value(value)
	}

	/// Calls `update` on the observable.
	pub fn update(&self, f: impl FnOnce(&T) -> T) -> CoreResult<()> {
		self.observable.update(f)
	}

	/// The observable this setter writes to.
	pub fn observable(&self) -> &ObservableValue<T> {
		&self.observable
	}
}

impl<T: 'static> Clone for ObservableSetter<T> {
	fn clone(&self) -> Self {
		Self {
			observable: self.observable.clone(),
		}
	}
}

/// Options of one `use_observable` key, refreshed on every render so the
/// subscription always sees the latest `on_change`.
struct ObservableSlot<T> {
	on_change: RefCell<Option<Rc<dyn Fn(&T)>>>,
	render: Cell<bool>,
}

/// Stable slot returned by [`ComponentContext::use_ref`].
pub struct RefObject<T> {
	cell: Rc<RefCell<Option<T>>>,
}

impl<T> RefObject<T> {
	/// Stores `value` in the slot.
	pub fn set(&self, value: T) {
		*self.cell.borrow_mut() = Some(value);
	}

	/// Empties the slot and returns its content.
	pub fn take(&self) -> Option<T> {
		self.cell.borrow_mut().take()
	}

	/// Returns `true` when the slot holds a value.
	pub fn is_set(&self) -> bool {
		self.cell.borrow().is_some()
	}

	/// Runs `f` with the slot content.
	pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
		f(self.cell.borrow().as_ref())
	}

	/// Returns `true` if both refs share the same slot.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.cell, &other.cell)
	}
}

impl<T: Clone> RefObject<T> {
	/// A clone of the slot content; `None` until something is stored.
	pub fn current(&self) -> Option<T> {
		self.cell.borrow().clone()
	}
}

impl<T> Clone for RefObject<T> {
	fn clone(&self) -> Self {
		Self {
			cell: Rc::clone(&self.cell),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for RefObject<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RefObject").field(&self.cell.borrow()).finish()
	}
}

impl ComponentContext {
	/// Keyed state.
	///
	/// The first call for `key` seeds it with `initial` (unless
	/// `initial_state` already did); later calls return the stored value. The
	/// setter stores the new value and schedules a batched render, so several
	/// setters called in one handler produce a single render that sees all of
	/// them.
	pub fn use_state<T: Clone + 'static>(
		&self,
		key: &str,
		initial: T,
	) -> ComponentResult<(T, StateSetter<T>)> {
		let value = {
			let mut state = self.instance.inner.state.borrow_mut();
			match state.get::<T>(key)? {
				Some(value) => value,
				None => {
					state.insert(key, initial.clone());
					initial
				}
			}
		};
		let setter = StateSetter {
			instance: Rc::downgrade(&self.instance.inner),
			key: key.to_string(),
			_marker: PhantomData,
		};
		Ok((value, setter))
	}

	/// Subscribes the instance to `observable` under `key`.
	///
	/// Exactly one subscription exists per key. When a later render passes a
	/// different observable, the old subscription is disposed before the new
	/// one is created. Each change stores the value under `key` in the state
	/// record, runs `on_change`, and schedules a batched render unless
	/// disabled in `options`.
	///
	/// Returns the observable's current value and a setter forwarding to it.
	pub fn use_observable<T: Clone + 'static>(
		&self,
		key: &str,
		observable: &ObservableValue<T>,
		options: UseObservableOptions<T>,
	) -> ComponentResult<(T, ObservableSetter<T>)> {
		let slot = self.observable_slot::<T>(key);
		*slot.on_change.borrow_mut() = options.on_change;
		slot.render.set(options.render);

		let weak = Rc::downgrade(&self.instance.inner);
		let owned_key = key.to_string();
		self.instance
			.inner
			.resources
			.try_use_disposable_with(key, observable.id(), || {
				let observer = observable.subscribe(move |value: &T| {
					let Some(instance) = ComponentInstance::from_weak(&weak) else {
						return;
					};
					instance
						.inner
						.state
						.borrow_mut()
						.insert(&owned_key, value.clone());
					let on_change = slot.on_change.borrow().clone();
					if let Some(on_change) = on_change {
						on_change(value);
					}
					if slot.render.get() {
						instance.mark_dirty(&owned_key);
						instance.schedule_update();
					}
				})?;
				Ok(Rc::new(observer))
			})?;

		let value = observable.get_value()?;
		self.instance
			.inner
			.state
			.borrow_mut()
			.insert(key, value.clone());
		Ok((
			value,
			ObservableSetter {
				observable: observable.clone(),
			},
		))
	}

	fn observable_slot<T: 'static>(&self, key: &str) -> Rc<ObservableSlot<T>> {
		let mut slots = self.instance.inner.observable_slots.borrow_mut();
		if let Some(slot) = slots
			.get(key)
			.cloned()
			.and_then(|slot| slot.downcast::<ObservableSlot<T>>().ok())
		{
			return slot;
		}
		let slot = Rc::new(ObservableSlot {
			on_change: RefCell::new(None),
			render: Cell::new(true),
		});
		slots.insert(key.to_string(), Rc::clone(&slot) as Rc<dyn Any>);
		slot
	}

	/// Keyed resource that lives as long as the instance.
	///
	/// `factory` runs only on the first call for `key`.
	pub fn use_disposable<T, F>(&self, key: &str, factory: F) -> ComponentResult<T>
	where
		T: Disposable + Clone + 'static,
		F: FnOnce() -> T,
	{
		self.instance.inner.resources.use_disposable(key, factory)
	}

	/// Keyed resource recreated whenever `deps` changes; the previous resource
	/// is disposed first.
	pub fn use_disposable_with<T, D, F>(&self, key: &str, deps: D, factory: F) -> ComponentResult<T>
	where
		T: Disposable + Clone + 'static,
		D: PartialEq + 'static,
		F: FnOnce() -> T,
	{
		self.instance
			.inner
			.resources
			.use_disposable_with(key, deps, factory)
	}

	/// Stable slot for imperatively assigned values such as DOM nodes.
	pub fn use_ref<T: 'static>(&self, key: &str) -> ComponentResult<RefObject<T>> {
		let mut refs = self.instance.inner.refs.borrow_mut();
		if let Some(existing) = refs.get(key) {
			return Rc::clone(existing)
				.downcast::<RefCell<Option<T>>>()
				.map(|cell| RefObject { cell })
				.map_err(|_| ComponentError::type_mismatch::<T>(key));
		}
		let cell = Rc::new(RefCell::new(None));
		refs.insert(key.to_string(), Rc::clone(&cell) as Rc<dyn Any>);
		Ok(RefObject { cell })
	}

	/// Applies `props` to the host element for this render pass.
	///
	/// Listeners installed by the previous call are removed first.
	pub fn use_host_props(&self, props: HostProps) -> ComponentResult<()> {
		props.apply(self.host(), &self.instance.inner.host_listeners);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ComponentDefinition, View};
	use lumen_core::{DisposeFn, Injector, flush_microtasks};
	use lumen_dom::{Element, Event};
	use rstest::rstest;
	use serial_test::serial;

	fn mount(definition: ComponentDefinition) -> ComponentInstance {
		let host = Element::new(definition.tag());
		let instance = ComponentInstance::new(&definition, &host, &Injector::new()).unwrap();
		instance.mount().unwrap();
		instance
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_two_setters_one_render() {
		let setters = Rc::new(RefCell::new(None));
		let instance = mount(
			ComponentDefinition::builder("x-profile")
				.render({
					let setters = Rc::clone(&setters);
					move |ctx| {
						let (count, set_count) = ctx.use_state("count", 0)?;
						let (name, set_name) = ctx.use_state("name", String::new())?;
						*setters.borrow_mut() = Some((set_count, set_name));
						Ok(format!("{}:{}", count, name))
					}
				})
				.build()
				.unwrap(),
		);

		let (set_count, set_name) = setters.borrow().clone().unwrap();
		set_count.set(1);
		set_name.set("x".to_string());
		flush_microtasks();

		assert_eq!(instance.render_count(), 2);
		assert_eq!(instance.host().text_content(), "1:x");
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_initial_state_wins_over_hook_default() {
		let instance = mount(
			ComponentDefinition::builder("x-seeded")
				.initial_state(|_| Ok(crate::StateRecord::new().with("count", 10)))
				.render(|ctx| {
					let (count, _) = ctx.use_state("count", 0)?;
					Ok(count.to_string())
				})
				.build()
				.unwrap(),
		);

		assert_eq!(instance.host().text_content(), "10");
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_changed_keys_visible_to_compare_state() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let instance = mount(
			ComponentDefinition::builder("x-compare")
				.compare_state({
					let seen = Rc::clone(&seen);
					move |ctx| {
						seen.borrow_mut().push(ctx.changed_keys());
						Ok(ctx.render_count() == 0)
					}
				})
				.render(|ctx| {
					ctx.use_state("a", 0)?;
					Ok("first")
				})
				.build()
				.unwrap(),
		);

		instance.set_state("a", 1);
		flush_microtasks();

		assert_eq!(*seen.borrow(), vec![Vec::<String>::new(), vec!["a".to_string()]]);
		assert_eq!(instance.render_count(), 2);
		assert!(instance.changed_keys().is_empty());
		assert_eq!(instance.host().text_content(), "first");
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_use_observable_renders_on_change() {
		let count = ObservableValue::new(0);
		let instance = mount(
			ComponentDefinition::builder("x-watch")
				.render({
					let count = count.clone();
					move |ctx| {
						let (value, _) =
							ctx.use_observable("count", &count, UseObservableOptions::new())?;
						Ok(value.to_string())
					}
				})
				.build()
				.unwrap(),
		);

		count.set_value(3).unwrap();
		count.set_value(4).unwrap();
		assert_eq!(instance.state::<i32>("count").unwrap(), Some(4));
		flush_microtasks();

		assert_eq!(instance.render_count(), 2);
		assert_eq!(instance.host().text_content(), "4");
		assert_eq!(count.observer_count(), 1);
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_on_change_without_render() {
		let count = ObservableValue::new(0);
		let seen = Rc::new(RefCell::new(Vec::new()));
		let instance = mount(
			ComponentDefinition::builder("x-quiet")
				.render({
					let count = count.clone();
					let seen = Rc::clone(&seen);
					move |ctx| {
						let seen = Rc::clone(&seen);
						let options = UseObservableOptions::new()
							.on_change(move |value: &i32| seen.borrow_mut().push(*value))
							.render(false);
						ctx.use_observable("count", &count, options)?;
						Ok(View::Empty)
					}
				})
				.build()
				.unwrap(),
		);

		count.set_value(1).unwrap();
		count.set_value(2).unwrap();
		flush_microtasks();

		assert_eq!(*seen.borrow(), vec![1, 2]);
		assert_eq!(instance.render_count(), 1);
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_swapping_observable_disposes_old_subscription() {
		let a = ObservableValue::new(1);
		let b = ObservableValue::new(2);
		let current = Rc::new(RefCell::new(a.clone()));
		let instance = mount(
			ComponentDefinition::builder("x-swap")
				.render({
					let current = Rc::clone(&current);
					move |ctx| {
						let observable = current.borrow().clone();
						let (value, _) =
							ctx.use_observable("value", &observable, UseObservableOptions::new())?;
						Ok(value.to_string())
					}
				})
				.build()
				.unwrap(),
		);
		assert_eq!(a.observer_count(), 1);

		*current.borrow_mut() = b.clone();
		instance.update_component().unwrap();

		assert_eq!(a.observer_count(), 0);
		assert_eq!(b.observer_count(), 1);
		assert_eq!(instance.host().text_content(), "2");

		a.set_value(10).unwrap();
		flush_microtasks();
		assert_eq!(instance.render_count(), 2);

		instance.unmount().unwrap();
		assert_eq!(b.observer_count(), 0);
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_observable_setter_forwards() {
		let count = ObservableValue::new(0);
		let setter = Rc::new(RefCell::new(None));
		mount(
			ComponentDefinition::builder("x-forward")
				.render({
					let count = count.clone();
					let setter = Rc::clone(&setter);
					move |ctx| {
						let (_, set) =
							ctx.use_observable("count", &count, UseObservableOptions::new())?;
						*setter.borrow_mut() = Some(set);
						Ok(View::Empty)
					}
				})
				.build()
				.unwrap(),
		);

		setter.borrow().as_ref().unwrap().set(9).unwrap();

		assert_eq!(count.get_value().unwrap(), 9);
		flush_microtasks();
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_use_disposable_lives_until_unmount() {
		let created = Rc::new(Cell::new(0));
		let disposed = Rc::new(Cell::new(0));
		let instance = mount(
			ComponentDefinition::builder("x-timer")
				.render({
					let created = Rc::clone(&created);
					let disposed = Rc::clone(&disposed);
					move |ctx| {
						ctx.use_disposable("timer", || {
							created.set(created.get() + 1);
							let disposed = Rc::clone(&disposed);
							Rc::new(DisposeFn::infallible(move || disposed.set(disposed.get() + 1)))
						})?;
						Ok(View::Empty)
					}
				})
				.build()
				.unwrap(),
		);

		instance.update_component().unwrap();
		instance.update_component().unwrap();
		assert_eq!(created.get(), 1);
		assert_eq!(disposed.get(), 0);

		instance.unmount().unwrap();
		assert_eq!(disposed.get(), 1);
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_use_disposable_with_recreates_on_new_deps() {
		let disposed = Rc::new(RefCell::new(Vec::new()));
		let url = Rc::new(RefCell::new("/a".to_string()));
		let instance = mount(
			ComponentDefinition::builder("x-socket")
				.render({
					let disposed = Rc::clone(&disposed);
					let url = Rc::clone(&url);
					move |ctx| {
						let current = url.borrow().clone();
						ctx.use_disposable_with("socket", current.clone(), || {
							let disposed = Rc::clone(&disposed);
							Rc::new(DisposeFn::infallible(move || {
								disposed.borrow_mut().push(current)
							}))
						})?;
						Ok(View::Empty)
					}
				})
				.build()
				.unwrap(),
		);

		instance.update_component().unwrap();
		assert!(disposed.borrow().is_empty());

		*url.borrow_mut() = "/b".to_string();
		instance.update_component().unwrap();
		assert_eq!(*disposed.borrow(), vec!["/a".to_string()]);

		instance.unmount().unwrap();
		assert_eq!(*disposed.borrow(), vec!["/a".to_string(), "/b".to_string()]);
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_use_ref_is_stable_and_starts_empty() {
		let refs = Rc::new(RefCell::new(Vec::new()));
		let instance = mount(
			ComponentDefinition::builder("x-ref")
				.render({
					let refs = Rc::clone(&refs);
					move |ctx| {
						let input = ctx.use_ref::<Element>("input")?;
						refs.borrow_mut().push(input.clone());
						if !input.is_set() {
							input.set(Element::new("input"));
						}
						Ok(input.current().map(View::from).unwrap_or_default())
					}
				})
				.build()
				.unwrap(),
		);

		instance.update_component().unwrap();

		let refs = refs.borrow();
		assert!(refs[0].ptr_eq(&refs[1]));
		assert_eq!(instance.host().to_html(), "<x-ref><input></input></x-ref>");
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_use_ref_type_mismatch() {
		let result = Rc::new(RefCell::new(None));
		mount(
			ComponentDefinition::builder("x-mismatch")
				.render({
					let result = Rc::clone(&result);
					move |ctx| {
						ctx.use_ref::<u8>("slot")?;
						*result.borrow_mut() = Some(ctx.use_ref::<String>("slot").map(|_| ()));
						Ok(View::Empty)
					}
				})
				.build()
				.unwrap(),
		);

		assert!(matches!(
			result.borrow_mut().take(),
			Some(Err(ComponentError::StateTypeMismatch { .. }))
		));
	}

	#[rstest]
	#[serial(microtasks)]
	fn test_host_props_replace_listeners_each_pass() {
		let clicks = Rc::new(Cell::new(0));
		let instance = mount(
			ComponentDefinition::builder("x-button")
				.render({
					let clicks = Rc::clone(&clicks);
					move |ctx| {
						let clicks = Rc::clone(&clicks);
						ctx.use_host_props(
							HostProps::new()
								.attribute("role", "button")
								.attribute("aria-pressed", None::<bool>)
								.style("cursor", "pointer")
								.property("tabIndex", 0)
								.on("click", move |_: &Event| clicks.set(clicks.get() + 1)),
						)?;
						Ok(View::Empty)
					}
				})
				.build()
				.unwrap(),
		);
		instance.update_component().unwrap();

		let host = instance.host();
		host.dispatch_event(&Event::new("click"));

		assert_eq!(clicks.get(), 1);
		assert_eq!(host.listener_count("click"), 1);
		assert_eq!(host.get_attribute("role").as_deref(), Some("button"));
		assert!(!host.has_attribute("aria-pressed"));
		assert_eq!(host.style_property("cursor").as_deref(), Some("pointer"));
		assert_eq!(host.property("tabIndex"), Some(serde_json::json!(0)));

		instance.unmount().unwrap();
		assert_eq!(host.listener_count("click"), 0);
	}
}
