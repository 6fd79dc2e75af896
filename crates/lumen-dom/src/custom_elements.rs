//! Custom element registry and lifecycle callbacks.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::error::{DomError, DomResult};
use crate::node::Element;

/// Callback error type for lifecycle hooks.
pub type LifecycleError = Box<dyn Error>;

/// Per-element lifecycle callbacks of an upgraded custom element.
pub trait CustomElementHooks {
	/// Called after the element becomes connected to the document.
	fn connected(&self, host: &Element) -> Result<(), LifecycleError>;

	/// Called after the element is detached from the document.
	fn disconnected(&self, host: &Element) -> Result<(), LifecycleError>;
}

/// Creates the lifecycle callbacks for each new element of a registered tag.
pub trait CustomElementFactory {
	/// Upgrades `host`, returning the callbacks bound to it.
	fn upgrade(&self, host: &Element) -> Rc<dyn CustomElementHooks>;
}

/// Registry mapping custom element names to factories.
///
/// Cloning the registry yields another handle to the same definitions.
#[derive(Clone, Default)]
pub struct CustomElementRegistry {
	definitions: Rc<RefCell<BTreeMap<String, Rc<dyn CustomElementFactory>>>>,
}

impl CustomElementRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `factory` under `name`.
	pub fn define(&self, name: &str, factory: Rc<dyn CustomElementFactory>) -> DomResult<()> {
		validate_custom_element_name(name)?;
		let mut definitions = self.definitions.borrow_mut();
		if definitions.contains_key(name) {
			return Err(DomError::AlreadyDefined(name.to_string()));
		}
		definitions.insert(name.to_string(), factory);
		tracing::debug!(tag = name, "custom element defined");
		Ok(())
	}

	/// Returns the factory registered for `name`.
	pub fn get(&self, name: &str) -> Option<Rc<dyn CustomElementFactory>> {
		self.definitions.borrow().get(name).cloned()
	}

	/// Returns `true` if `name` is registered.
	pub fn is_defined(&self, name: &str) -> bool {
		self.definitions.borrow().contains_key(name)
	}

	/// Registered names in sorted order.
	pub fn names(&self) -> Vec<String> {
		self.definitions.borrow().keys().cloned().collect()
	}
}

impl fmt::Debug for CustomElementRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CustomElementRegistry")
			.field("names", &self.names())
			.finish()
	}
}

/// Checks the custom element naming rules.
///
/// A valid name starts with a lowercase ASCII letter, contains a hyphen and has
/// no uppercase ASCII letters.
pub fn validate_custom_element_name(name: &str) -> DomResult<()> {
	let starts_lowercase = name
		.chars()
		.next()
		.is_some_and(|first| first.is_ascii_lowercase());
	let valid = starts_lowercase
		&& name.contains('-')
		&& !name.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace());
	if valid {
		Ok(())
	} else {
		Err(DomError::InvalidCustomElementName(name.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct NoopHooks;

	impl CustomElementHooks for NoopHooks {
		fn connected(&self, _host: &Element) -> Result<(), LifecycleError> {
			Ok(())
		}

		fn disconnected(&self, _host: &Element) -> Result<(), LifecycleError> {
			Ok(())
		}
	}

	struct NoopFactory;

	impl CustomElementFactory for NoopFactory {
		fn upgrade(&self, _host: &Element) -> Rc<dyn CustomElementHooks> {
			Rc::new(NoopHooks)
		}
	}

	#[rstest]
	#[case("my-counter")]
	#[case("x-a")]
	#[case("todo-list-item")]
	fn test_valid_names(#[case] name: &str) {
		assert!(validate_custom_element_name(name).is_ok());
	}

	#[rstest]
	#[case("counter")]
	#[case("My-counter")]
	#[case("my-Counter")]
	#[case("-counter")]
	#[case("1-counter")]
	#[case("")]
	#[case("my counter-x")]
	fn test_invalid_names(#[case] name: &str) {
		assert_eq!(
			validate_custom_element_name(name),
			Err(DomError::InvalidCustomElementName(name.to_string()))
		);
	}

	#[rstest]
	fn test_define_rejects_duplicates() {
		let registry = CustomElementRegistry::new();
		registry.define("my-counter", Rc::new(NoopFactory)).unwrap();

		assert!(registry.is_defined("my-counter"));
		assert_eq!(
			registry.define("my-counter", Rc::new(NoopFactory)).unwrap_err(),
			DomError::AlreadyDefined("my-counter".to_string())
		);
		assert_eq!(registry.names(), vec!["my-counter".to_string()]);
	}
}
