//! Lumen Components - Custom element component runtime
//!
//! Renders components into custom elements and keeps the DOM in sync with
//! reactive state without a virtual DOM diff.
//!
//! ## Building blocks
//!
//! - [`ComponentDefinition`]: tag name plus lifecycle callbacks (`initial_state`,
//!   `constructed`, `resources`, `compare_state`, `render`)
//! - [`ComponentInstance`]: one live element running a definition; owns the
//!   state record and a [`ResourceManager`]
//! - Hooks on [`ComponentContext`]: `use_state`, `use_observable`,
//!   `use_disposable`, `use_ref`, `use_host_props`
//! - Update scheduling: `schedule_update` batches any number of triggers in one
//!   turn into a single microtask render; `update_component` renders now
//! - [`binding`]: text, attribute, style and property nodes bound directly to
//!   an `ObservableValue`
//!
//! ## Example
//!
//! ```
//! use lumen_components::{ComponentDefinition, HostProps, define_component, component_instance};
//! use lumen_core::{Injector, flush_microtasks};
//! use lumen_dom::{Document, Event};
//!
//! let counter = ComponentDefinition::builder("x-counter")
//! 	.render(|ctx| {
//! 		let (count, set_count) = ctx.use_state("count", 0)?;
//! 		ctx.use_host_props(HostProps::new().on("click", move |_: &Event| {
//! 			set_count.update(|count| count + 1)
//! 		}))?;
//! 		Ok(format!("clicked {} times", count))
//! 	})
//! 	.build()
//! 	.unwrap();
//!
//! let document = Document::new();
//! define_component(&document, counter, &Injector::new()).unwrap();
//! let host = document.create_element("x-counter");
//! document.body().append_child(&host).unwrap();
//!
//! host.dispatch_event(&Event::new("click"));
//! host.dispatch_event(&Event::new("click"));
//! flush_microtasks();
//!
//! assert_eq!(host.text_content(), "clicked 2 times");
//! assert_eq!(component_instance(&host).unwrap().render_count(), 2);
//! ```

#![warn(missing_docs)]

pub mod binding;
pub mod context;
pub mod definition;
pub mod element;
pub mod error;
pub mod handle;
pub mod hooks;
pub mod host_props;
pub mod instance;
pub mod render_context;
pub mod resource_manager;
pub mod scheduler;
pub mod state;
pub mod view;

pub use binding::{Binding, bind_attribute, bind_property, bind_style, bind_text, to_dom_string};
pub use context::ComponentContext;
pub use definition::{ComponentDefinition, ComponentDefinitionBuilder};
pub use element::{component_instance, define_component};
pub use error::{ComponentError, ComponentResult};
pub use handle::{InstanceHandle, LoadOutcome};
pub use hooks::{ObservableSetter, RefObject, StateSetter, UseObservableOptions};
pub use host_props::HostProps;
pub use instance::ComponentInstance;
pub use render_context::{
	RenderContextGuard, clear_render_context, get_render_context, set_render_context,
	with_render_context,
};
pub use resource_manager::ResourceManager;
pub use scheduler::UpdatePhase;
pub use state::StateRecord;
pub use view::View;
