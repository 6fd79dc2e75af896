//! Reactive Bindings
//!
//! DOM fragments that update themselves straight from an [`ObservableValue`],
//! outside the owning component's render cycle. A binding writes the current
//! value immediately, then rewrites its target synchronously on every change.
//!
//! ## Stringification
//!
//! Values are converted with [`to_dom_string`]:
//!
//! | Serialized as | Text |
//! |---------------|------|
//! | `null` (`None`, `()`) | `""` |
//! | string | the string itself |
//! | number, bool | its textual form (`1.0_f64` is `"1"`) |
//! | anything else | JSON |
//!
//! JSON has no NaN or infinity: non-finite floats serialize to `null` and are
//! treated like `None`.
//!
//! Attribute bindings remove the attribute, and style bindings clear the
//! property, when the value serializes to `null`.
//!
//! ## Ownership
//!
//! A binding created while a render is in progress registers its subscription
//! with the active [`ResourceManager`](crate::ResourceManager) under a fresh
//! synthetic key and is disposed when the component unmounts. Created outside
//! any render, it is unmanaged: the caller must dispose it.
//!
//! ```
//! use lumen_components::binding::bind_text;
//! use lumen_core::{Disposable, ObservableValue};
//!
//! let count = ObservableValue::new(0);
//! let binding = bind_text(&count).unwrap();
//! count.set_value(5).unwrap();
//! assert_eq!(binding.target().data(), "5");
//!
//! binding.dispose().unwrap();
//! ```

use std::rc::Rc;

use lumen_core::{Disposable, DisposeError, ObservableValue, current_config};
use lumen_dom::{Element, TextNode};
use serde::Serialize;
use serde_json::Value;

use crate::error::ComponentResult;
use crate::render_context::get_render_context;

/// Converts `value` to the text written into the DOM.
pub fn to_dom_string<T: Serialize + ?Sized>(value: &T) -> String {
	to_dom_value(value).unwrap_or_default()
}

/// Like [`to_dom_string`], but `None` for values that serialize to `null`.
pub fn to_dom_value<T: Serialize + ?Sized>(value: &T) -> Option<String> {
	match to_json(value) {
		Value::Null => None,
		Value::String(text) => Some(text),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Number(number) => Some(match number.as_f64() {
			Some(float) if number.is_f64() => float_text(float),
			_ => number.to_string(),
		}),
		other => Some(other.to_string()),
	}
}

// Whole floats print without a fraction ("1", not "1.0"), and zero drops its sign.
fn float_text(float: f64) -> String {
	if float == 0.0 {
		"0".to_string()
	} else {
		float.to_string()
	}
}

/// Serializes `value` to JSON; failures are logged and become `null`.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
	serde_json::to_value(value).unwrap_or_else(|error| {
		tracing::warn!(error = %error, "value could not be serialized for the DOM");
		Value::Null
	})
}

/// A live binding between an observable and a DOM target.
///
/// Disposing the binding stops further updates; the target keeps its last
/// value.
pub struct Binding<N> {
	target: N,
	subscription: Rc<dyn Disposable>,
	managed_key: Option<String>,
}

impl<N> Binding<N> {
	/// The bound node.
	pub fn target(&self) -> &N {
		&self.target
	}

	/// Consumes the binding handle, returning the node. The subscription stays
	/// alive.
	pub fn into_target(self) -> N {
		self.target
	}

	/// Returns `true` when the subscription is owned by a component.
	pub fn is_managed(&self) -> bool {
		self.managed_key.is_some()
	}

	/// Resource manager key of a managed binding.
	pub fn managed_key(&self) -> Option<&str> {
		self.managed_key.as_deref()
	}
}

impl<N> Disposable for Binding<N> {
	fn dispose(&self) -> Result<(), DisposeError> {
		self.subscription.dispose()
	}
}

impl<N: std::fmt::Debug> std::fmt::Debug for Binding<N> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Binding")
			.field("target", &self.target)
			.field("managed_key", &self.managed_key)
			.finish()
	}
}

fn bind<T, N, F>(observable: &ObservableValue<T>, target: N, kind: &'static str, write: F) -> ComponentResult<Binding<N>>
where
	T: Serialize + Clone + 'static,
	F: Fn(&T) + 'static,
{
	observable.with_value(&write)?;
	let subscription: Rc<dyn Disposable> = Rc::new(observable.subscribe(write)?);

	let managed_key = match get_render_context() {
		Some(manager) => match manager.track(Rc::clone(&subscription)) {
			Ok(key) => Some(key),
			Err(error) => {
				// A dropped ValueObserver stays subscribed.
				if let Err(dispose_error) = subscription.dispose() {
					tracing::error!(kind, error = %dispose_error, "failed to release binding subscription");
				}
				return Err(error);
			}
		},
		None => {
			if current_config().warn_unmanaged_bindings {
				tracing::warn!(kind, "binding created outside a render; the caller must dispose it");
			}
			None
		}
	};

	Ok(Binding {
		target,
		subscription,
		managed_key,
	})
}

/// Creates a text node showing `observable`.
pub fn bind_text<T>(observable: &ObservableValue<T>) -> ComponentResult<Binding<TextNode>>
where
	T: Serialize + Clone + 'static,
{
	let node = TextNode::new("");
	let target = node.clone();
	bind(observable, node, "text", move |value: &T| {
		target.set_data(to_dom_string(value));
	})
}

/// Keeps attribute `name` of `element` in sync with `observable`.
pub fn bind_attribute<T>(
	element: &Element,
	name: &str,
	observable: &ObservableValue<T>,
) -> ComponentResult<Binding<Element>>
where
	T: Serialize + Clone + 'static,
{
	let target = element.clone();
	let name = name.to_string();
	bind(observable, element.clone(), "attribute", move |value: &T| {
		match to_dom_value(value) {
			Some(text) => target.set_attribute(&name, text),
			None => target.remove_attribute(&name),
		}
	})
}

/// Keeps inline style `property` of `element` in sync with `observable`.
pub fn bind_style<T>(
	element: &Element,
	property: &str,
	observable: &ObservableValue<T>,
) -> ComponentResult<Binding<Element>>
where
	T: Serialize + Clone + 'static,
{
	let target = element.clone();
	let property = property.to_string();
	bind(observable, element.clone(), "style", move |value: &T| {
		target.set_style_property(&property, &to_dom_string(value));
	})
}

/// Keeps DOM property `name` of `element` in sync with `observable`.
pub fn bind_property<T>(
	element: &Element,
	name: &str,
	observable: &ObservableValue<T>,
) -> ComponentResult<Binding<Element>>
where
	T: Serialize + Clone + 'static,
{
	let target = element.clone();
	let name = name.to_string();
	bind(observable, element.clone(), "property", move |value: &T| {
		target.set_property(&name, to_json(value));
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::render_context::with_render_context;
	use crate::resource_manager::ResourceManager;
	use rstest::rstest;
	use serde::Serialize;
	use serde_json::json;

	#[derive(Clone, PartialEq, Serialize)]
	struct Point {
		x: i32,
		y: i32,
	}

	#[rstest]
	#[case(json!(null), "")]
	#[case(json!("hi"), "hi")]
	#[case(json!(0), "0")]
	#[case(json!(1.5), "1.5")]
	#[case(json!(1.0), "1")]
	#[case(json!(-0.0), "0")]
	#[case(json!(-2.0), "-2")]
	#[case(json!(false), "false")]
	#[case(json!([1, 2]), "[1,2]")]
	#[case(json!({"a": 1}), "{\"a\":1}")]
	fn test_to_dom_string(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(to_dom_string(&value), expected);
	}

	#[rstest]
	fn test_to_dom_string_for_rust_values() {
		assert_eq!(to_dom_string(&None::<i32>), "");
		assert_eq!(to_dom_string(&Some(3)), "3");
		assert_eq!(to_dom_string(&Point { x: 1, y: 2 }), "{\"x\":1,\"y\":2}");
	}

	#[rstest]
	fn test_attribute_binding_removes_on_none_and_keeps_zero() {
		let element = Element::new("div");
		let value = ObservableValue::new(Some(1));
		let binding = bind_attribute(&element, "data-count", &value).unwrap();
		assert_eq!(element.get_attribute("data-count").as_deref(), Some("1"));

		value.set_value(None).unwrap();
		assert!(!element.has_attribute("data-count"));

		value.set_value(Some(0)).unwrap();
		assert_eq!(element.get_attribute("data-count").as_deref(), Some("0"));
		binding.dispose().unwrap();
	}

	#[rstest]
	fn test_style_binding_clears_on_none() {
		let element = Element::new("div");
		let color = ObservableValue::new(Some("red".to_string()));
		let _binding = bind_style(&element, "color", &color).unwrap();
		assert_eq!(element.style_property("color").as_deref(), Some("red"));

		color.set_value(None).unwrap();
		assert_eq!(element.style_property("color"), None);
	}

	#[rstest]
	fn test_property_binding_keeps_json() {
		let element = Element::new("input");
		let checked = ObservableValue::new(true);
		let _binding = bind_property(&element, "checked", &checked).unwrap();

		checked.set_value(false).unwrap();
		assert_eq!(element.property("checked"), Some(json!(false)));
	}

	#[rstest]
	fn test_dispose_stops_updates() {
		let count = ObservableValue::new(1);
		let binding = bind_text(&count).unwrap();

		binding.dispose().unwrap();
		count.set_value(2).unwrap();

		assert_eq!(binding.target().data(), "1");
		assert_eq!(count.observer_count(), 0);
		assert!(!binding.is_managed());
	}

	#[rstest]
	fn test_binding_inside_render_context_is_managed() {
		let manager = ResourceManager::new();
		let count = ObservableValue::new(1);

		let binding = with_render_context(&manager, || bind_text(&count)).unwrap();

		assert!(binding.is_managed());
		assert!(manager.contains(binding.managed_key().unwrap()));
		manager.dispose().unwrap();
		assert_eq!(count.observer_count(), 0);
	}

	#[rstest]
	fn test_non_finite_floats_render_like_none() {
		assert_eq!(to_dom_value(&f64::NAN), None);
		assert_eq!(to_dom_string(&f64::INFINITY), "");
		assert_eq!(to_dom_string(&3.0_f64), "3");
	}

	#[rstest]
	fn test_binding_in_disposed_context_does_not_leak_subscription() {
		let manager = ResourceManager::new();
		manager.dispose().unwrap();
		let count = ObservableValue::new(1);

		let err = with_render_context(&manager, || bind_text(&count)).unwrap_err();

		assert!(err.is_already_disposed());
		assert_eq!(count.observer_count(), 0);
	}

	#[rstest]
	fn test_binding_on_disposed_observable_fails() {
		let count = ObservableValue::new(1);
		count.dispose().unwrap();

		let err = bind_text(&count).unwrap_err();
		assert!(err.is_already_disposed());
	}
}
