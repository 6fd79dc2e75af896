//! Lumen DOM - In-memory document model
//!
//! A small, single-threaded document tree with the parts of the DOM the
//! component runtime touches: element attributes, inline styles, properties,
//! event listeners, text nodes, and custom elements with connected and
//! disconnected callbacks.
//!
//! Nodes are `Rc` handles compared by identity. Lifecycle callbacks run after a
//! mutation has been applied; callback failures are logged and returned as
//! [`DomError::Lifecycle`] without rolling the mutation back.

#![warn(missing_docs)]

pub mod custom_elements;
pub mod document;
pub mod error;
pub mod event;
pub mod node;

pub use custom_elements::{
	CustomElementFactory, CustomElementHooks, CustomElementRegistry, LifecycleError,
	validate_custom_element_name,
};
pub use document::Document;
pub use error::{DomError, DomResult, LifecycleFailure, LifecyclePhase};
pub use event::{Event, EventHandler, ListenerId};
pub use node::{Element, Node, TextNode};
