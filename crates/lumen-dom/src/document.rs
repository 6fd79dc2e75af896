//! Documents.

use crate::custom_elements::CustomElementRegistry;
use crate::node::{Element, TextNode};

/// A document: a connected root element plus its custom element registry.
///
/// Elements appended (directly or transitively) to [`Document::body`] are
/// connected; connecting an upgraded custom element runs its `connected`
/// callback.
#[derive(Debug, Clone)]
pub struct Document {
	body: Element,
	registry: CustomElementRegistry,
}

impl Document {
	/// Creates an empty document with its own registry.
	pub fn new() -> Self {
		Self::with_registry(CustomElementRegistry::new())
	}

	/// Creates an empty document sharing `registry`.
	pub fn with_registry(registry: CustomElementRegistry) -> Self {
		Self {
			body: Element::new_root("body"),
			registry,
		}
	}

	/// The root element.
	pub fn body(&self) -> &Element {
		&self.body
	}

	/// The custom element registry.
	pub fn registry(&self) -> &CustomElementRegistry {
		&self.registry
	}

	/// Creates an element, upgrading it when `tag` names a defined custom
	/// element.
	pub fn create_element(&self, tag: &str) -> Element {
		let element = Element::new(tag.to_ascii_lowercase());
		if let Some(factory) = self.registry.get(element.tag_name()) {
			let hooks = factory.upgrade(&element);
			element.upgrade(hooks);
			tracing::trace!(tag = element.tag_name(), "custom element upgraded");
		}
		element
	}

	/// Creates a text node.
	pub fn create_text_node(&self, data: &str) -> TextNode {
		TextNode::new(data)
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}
