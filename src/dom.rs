//! In-memory DOM module.
//!
//! This module provides access to lumen-dom: elements, text nodes, events and
//! the custom element registry.
//!
//! # Examples
//!
//! ```rust
//! # #[cfg(feature = "dom")]
//! # {
//! use lumen::dom::{Document, TextNode};
//!
//! let document = Document::new();
//! let div = document.create_element("div");
//! div.append_child(TextNode::new("hello")).unwrap();
//! document.body().append_child(&div).unwrap();
//! assert!(div.is_connected());
//! # }
//! ```

#[cfg(feature = "dom")]
pub use lumen_dom::*;
