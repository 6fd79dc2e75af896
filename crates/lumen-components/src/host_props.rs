//! Props applied to a component's own host element.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lumen_dom::{Element, Event, EventHandler, ListenerId};
use serde::Serialize;
use serde_json::Value;

use crate::binding::{to_dom_value, to_json};

/// Attributes, styles, properties and listeners for the host element, built
/// fresh on each render and applied with
/// [`ComponentContext::use_host_props`](crate::ComponentContext::use_host_props).
///
/// Values follow the binding stringification rules: a value serializing to
/// `null` removes the attribute or clears the style property.
#[derive(Default)]
pub struct HostProps {
	attributes: Vec<(String, Option<String>)>,
	styles: Vec<(String, String)>,
	properties: Vec<(String, Value)>,
	listeners: Vec<(String, EventHandler)>,
}

impl HostProps {
	/// Empty props.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets or removes an attribute.
	pub fn attribute<V: Serialize>(mut self, name: &str, value: V) -> Self {
		self.attributes.push((name.to_string(), to_dom_value(&value)));
		self
	}

	/// Sets or clears an inline style property.
	pub fn style<V: Serialize>(mut self, property: &str, value: V) -> Self {
		self.styles
			.push((property.to_string(), to_dom_value(&value).unwrap_or_default()));
		self
	}

	/// Sets a DOM property.
	pub fn property<V: Serialize>(mut self, name: &str, value: V) -> Self {
		self.properties.push((name.to_string(), to_json(&value)));
		self
	}

	/// Adds an event listener.
	pub fn on<F>(mut self, event_type: &str, handler: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		let handler: EventHandler = Rc::new(handler);
		self.listeners.push((event_type.to_string(), handler));
		self
	}

	pub(crate) fn apply(self, host: &Element, installed: &RefCell<Vec<ListenerId>>) {
		for (name, value) in self.attributes {
			match value {
				Some(value) => host.set_attribute(&name, value),
				None => host.remove_attribute(&name),
			}
		}
		for (property, value) in self.styles {
			host.set_style_property(&property, &value);
		}
		for (name, value) in self.properties {
			host.set_property(&name, value);
		}

		let mut installed = installed.borrow_mut();
		for id in installed.drain(..) {
			host.remove_event_listener(id);
		}
		for (event_type, handler) in self.listeners {
			installed.push(host.add_event_handler(&event_type, handler));
		}
	}
}

impl fmt::Debug for HostProps {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let listeners: Vec<&str> = self.listeners.iter().map(|(name, _)| name.as_str()).collect();
		f.debug_struct("HostProps")
			.field("attributes", &self.attributes)
			.field("styles", &self.styles)
			.field("properties", &self.properties)
			.field("listeners", &listeners)
			.finish()
	}
}
