//! The context passed to component callbacks.

use std::fmt;

use lumen_core::Injector;
use lumen_dom::Element;

use crate::error::ComponentResult;
use crate::handle::InstanceHandle;
use crate::instance::ComponentInstance;
use crate::resource_manager::ResourceManager;

/// Access to the instance a callback runs for.
///
/// Hooks (`use_state`, `use_observable`, ...) are methods on this type, so
/// they can only be called from inside component callbacks.
pub struct ComponentContext {
	pub(crate) instance: ComponentInstance,
}

impl ComponentContext {
	pub(crate) fn new(instance: ComponentInstance) -> Self {
		Self { instance }
	}

	/// The host element.
	pub fn host(&self) -> &Element {
		self.instance.host()
	}

	/// The injector scope of the instance.
	pub fn injector(&self) -> &Injector {
		self.instance.injector()
	}

	/// The instance's resource manager.
	pub fn resource_manager(&self) -> &ResourceManager {
		self.instance.resource_manager()
	}

	/// Number of renders completed before this one.
	pub fn render_count(&self) -> u64 {
		self.instance.render_count()
	}

	/// State keys written since the last completed render, sorted.
	pub fn changed_keys(&self) -> Vec<String> {
		self.instance.changed_keys()
	}

	/// Returns a clone of the state value under `key`.
	pub fn state<T: Clone + 'static>(&self, key: &str) -> ComponentResult<Option<T>> {
		self.instance.state(key)
	}

	/// A weak handle to the instance, for callbacks that outlive the render.
	pub fn handle(&self) -> InstanceHandle {
		self.instance.handle()
	}
}

impl fmt::Debug for ComponentContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentContext")
			.field("instance", &self.instance)
			.finish()
	}
}
