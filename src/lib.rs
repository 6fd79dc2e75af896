//! # Lumen
//!
//! A component runtime that renders into native custom elements and keeps the
//! DOM in sync with reactive state, without a virtual DOM diff pass.
//!
//! ## Core Principles
//!
//! - **Batched updates**: any number of state changes in one turn cause one render
//! - **Direct bindings**: text, attributes, styles and properties can follow an
//!   observable on their own, outside the owning component's render
//! - **Leak-proof teardown**: every subscription a component creates is disposed
//!   exactly once when it disconnects
//! - **Single-threaded**: all state is `Rc`-based and per thread
//!
//! ## Feature Flags
//!
//! - `minimal` - Core primitives only (`lumen::core`)
//! - `dom` - In-memory DOM and custom element registry
//! - `components` - Component runtime (implies `dom`)
//! - `full` (default) - Everything
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "components")]
//! # {
//! use lumen::prelude::*;
//!
//! let count = ObservableValue::new(0);
//! let label = ComponentDefinition::builder("x-label")
//! 	.render({
//! 		let count = count.clone();
//! 		move |ctx| {
//! 			let (value, _) = ctx.use_observable("count", &count, UseObservableOptions::new())?;
//! 			Ok(View::text(format!("count is {}", value)))
//! 		}
//! 	})
//! 	.build()
//! 	.unwrap();
//!
//! let document = Document::new();
//! define_component(&document, label, &Injector::new()).unwrap();
//! let host = document.create_element("x-label");
//! document.body().append_child(&host).unwrap();
//!
//! count.set_value(3).unwrap();
//! flush_microtasks();
//! assert_eq!(host.text_content(), "count is 3");
//! # }
//! ```

pub mod components;
pub mod core;
pub mod dom;

/// Commonly used types.
pub mod prelude {
	pub use lumen_core::{
		Disposable, DisposeError, DisposeFn, Injector, ObservableValue, RuntimeConfig, configure,
		flush_microtasks, queue_microtask,
	};

	#[cfg(feature = "dom")]
	pub use lumen_dom::{Document, Element, Event, Node, TextNode};

	#[cfg(feature = "components")]
	pub use lumen_components::{
		ComponentContext, ComponentDefinition, ComponentError, ComponentInstance, ComponentResult,
		HostProps, ResourceManager, StateRecord, UseObservableOptions, View, bind_attribute,
		bind_property, bind_style, bind_text, component_instance, define_component,
	};
}
