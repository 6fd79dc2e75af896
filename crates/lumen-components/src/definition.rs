//! Component definitions.

use std::fmt;
use std::rc::Rc;

use lumen_core::Disposable;
use lumen_dom::validate_custom_element_name;

use crate::context::ComponentContext;
use crate::error::{ComponentError, ComponentResult};
use crate::state::StateRecord;
use crate::view::View;

type Callback<R> = Rc<dyn Fn(&ComponentContext) -> ComponentResult<R>>;

/// Immutable descriptor of a component: its tag name and lifecycle callbacks.
///
/// Built once with [`ComponentDefinition::builder`] and shared by every
/// instance; cloning is cheap.
///
/// # Example
///
/// ```
/// use lumen_components::{ComponentDefinition, StateRecord, View};
///
/// let counter = ComponentDefinition::builder("x-counter")
/// 	.initial_state(|_| Ok(StateRecord::new().with("count", 0)))
/// 	.render(|ctx| {
/// 		let (count, _set_count) = ctx.use_state("count", 0)?;
/// 		Ok(View::text(count.to_string()))
/// 	})
/// 	.build()
/// 	.unwrap();
///
/// assert_eq!(counter.tag(), "x-counter");
/// ```
#[derive(Clone)]
pub struct ComponentDefinition {
	tag: String,
	initial_state: Option<Callback<StateRecord>>,
	constructed: Option<Callback<Option<Box<dyn Disposable>>>>,
	resources: Option<Callback<Vec<Box<dyn Disposable>>>>,
	compare_state: Option<Callback<bool>>,
	render: Callback<View>,
	scoped_injector: bool,
}

impl ComponentDefinition {
	/// Starts a definition for the custom element `tag`.
	pub fn builder(tag: impl Into<String>) -> ComponentDefinitionBuilder {
		ComponentDefinitionBuilder {
			tag: tag.into(),
			initial_state: None,
			constructed: None,
			resources: None,
			compare_state: None,
			render: None,
			scoped_injector: false,
		}
	}

	/// Custom element tag name.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// Whether each instance gets its own child injector.
	pub fn has_scoped_injector(&self) -> bool {
		self.scoped_injector
	}

	pub(crate) fn initial_state(&self, ctx: &ComponentContext) -> ComponentResult<StateRecord> {
		match &self.initial_state {
			Some(callback) => callback(ctx),
			None => Ok(StateRecord::new()),
		}
	}

	pub(crate) fn constructed(
		&self,
		ctx: &ComponentContext,
	) -> ComponentResult<Option<Box<dyn Disposable>>> {
		match &self.constructed {
			Some(callback) => callback(ctx),
			None => Ok(None),
		}
	}

	pub(crate) fn resources(&self, ctx: &ComponentContext) -> ComponentResult<Vec<Box<dyn Disposable>>> {
		match &self.resources {
			Some(callback) => callback(ctx),
			None => Ok(Vec::new()),
		}
	}

	/// `None` when the definition has no `compare_state` callback.
	pub(crate) fn compare_state(&self, ctx: &ComponentContext) -> Option<ComponentResult<bool>> {
		self.compare_state.as_ref().map(|callback| callback(ctx))
	}

	pub(crate) fn render(&self, ctx: &ComponentContext) -> ComponentResult<View> {
		(self.render)(ctx)
	}
}

impl fmt::Debug for ComponentDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentDefinition")
			.field("tag", &self.tag)
			.field("initial_state", &self.initial_state.is_some())
			.field("constructed", &self.constructed.is_some())
			.field("resources", &self.resources.is_some())
			.field("compare_state", &self.compare_state.is_some())
			.field("scoped_injector", &self.scoped_injector)
			.finish()
	}
}

/// Builder for [`ComponentDefinition`].
pub struct ComponentDefinitionBuilder {
	tag: String,
	initial_state: Option<Callback<StateRecord>>,
	constructed: Option<Callback<Option<Box<dyn Disposable>>>>,
	resources: Option<Callback<Vec<Box<dyn Disposable>>>>,
	compare_state: Option<Callback<bool>>,
	render: Option<Callback<View>>,
	scoped_injector: bool,
}

impl ComponentDefinitionBuilder {
	/// Seeds the state record of each new instance.
	pub fn initial_state<F>(mut self, f: F) -> Self
	where
		F: Fn(&ComponentContext) -> ComponentResult<StateRecord> + 'static,
	{
		self.initial_state = Some(Rc::new(f));
		self
	}

	/// Runs once per instance after the state is seeded. A returned disposable
	/// is disposed on unmount.
	pub fn constructed<F>(mut self, f: F) -> Self
	where
		F: Fn(&ComponentContext) -> ComponentResult<Option<Box<dyn Disposable>>> + 'static,
	{
		self.constructed = Some(Rc::new(f));
		self
	}

	/// Resources created once per instance and disposed on unmount.
	pub fn resources<F>(mut self, f: F) -> Self
	where
		F: Fn(&ComponentContext) -> ComponentResult<Vec<Box<dyn Disposable>>> + 'static,
	{
		self.resources = Some(Rc::new(f));
		self
	}

	/// Called before each render. Returning `false` skips `render` and the
	/// patch; the callback is expected to have updated the DOM itself.
	pub fn compare_state<F>(mut self, f: F) -> Self
	where
		F: Fn(&ComponentContext) -> ComponentResult<bool> + 'static,
	{
		self.compare_state = Some(Rc::new(f));
		self
	}

	/// Produces the host's children.
	pub fn render<F, V>(mut self, f: F) -> Self
	where
		F: Fn(&ComponentContext) -> ComponentResult<V> + 'static,
		V: Into<View>,
	{
		self.render = Some(Rc::new(move |ctx: &ComponentContext| f(ctx).map(Into::into)));
		self
	}

	/// Gives each instance a child scope of the injector it is mounted with,
	/// disposed on unmount.
	pub fn scoped_injector(mut self, scoped: bool) -> Self {
		self.scoped_injector = scoped;
		self
	}

	/// Validates and builds the definition.
	pub fn build(self) -> ComponentResult<ComponentDefinition> {
		validate_custom_element_name(&self.tag)
			.map_err(|err| ComponentError::InvalidDefinition(err.to_string()))?;
		let render = self.render.ok_or_else(|| {
			ComponentError::InvalidDefinition(format!("<{}> has no render callback", self.tag))
		})?;

		Ok(ComponentDefinition {
			tag: self.tag,
			initial_state: self.initial_state,
			constructed: self.constructed,
			resources: self.resources,
			compare_state: self.compare_state,
			render,
			scoped_injector: self.scoped_injector,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_build_requires_render() {
		let err = ComponentDefinition::builder("x-empty").build().unwrap_err();
		assert_eq!(
			err,
			ComponentError::InvalidDefinition("<x-empty> has no render callback".to_string())
		);
	}

	#[rstest]
	#[case("counter")]
	#[case("X-Counter")]
	fn test_build_rejects_invalid_tags(#[case] tag: &str) {
		let err = ComponentDefinition::builder(tag)
			.render(|_| Ok(View::Empty))
			.build()
			.unwrap_err();
		assert!(matches!(err, ComponentError::InvalidDefinition(_)));
	}

	#[rstest]
	fn test_build_keeps_options() {
		let definition = ComponentDefinition::builder("x-scoped")
			.scoped_injector(true)
			.render(|_| Ok("hi"))
			.build()
			.unwrap();

		assert_eq!(definition.tag(), "x-scoped");
		assert!(definition.has_scoped_injector());
	}
}
