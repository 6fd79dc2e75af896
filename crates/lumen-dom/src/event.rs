//! Events and listeners.
//!
//! Events are dispatched directly to the target element's listeners; there is
//! no capture or bubbling phase.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// Identifies a registered listener on one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Listener callback type.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// A dispatched event.
pub struct Event {
	event_type: String,
	detail: Value,
	default_prevented: Cell<bool>,
}

impl Event {
	/// Creates an event of the given type with no detail.
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			detail: Value::Null,
			default_prevented: Cell::new(false),
		}
	}

	/// Attaches a detail payload.
	pub fn with_detail(mut self, detail: Value) -> Self {
		self.detail = detail;
		self
	}

	/// The event type, e.g. `"click"`.
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// The detail payload.
	pub fn detail(&self) -> &Value {
		&self.detail
	}

	/// Marks the event as handled.
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	/// Returns `true` if a listener called [`Event::prevent_default`].
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}
}

impl fmt::Debug for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("event_type", &self.event_type)
			.field("detail", &self.detail)
			.field("default_prevented", &self.default_prevented.get())
			.finish()
	}
}

pub(crate) struct Listener {
	pub(crate) id: ListenerId,
	pub(crate) event_type: String,
	pub(crate) handler: EventHandler,
}
