//! Element and text nodes.
//!
//! Nodes are reference-counted handles; equality is identity. Children hold
//! strong references, parents are weak, so a detached subtree is freed once the
//! last handle to it is dropped.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::custom_elements::CustomElementHooks;
use crate::error::{DomError, DomResult, LifecycleFailure, LifecyclePhase};
use crate::event::{Event, EventHandler, Listener, ListenerId};

pub(crate) struct ElementInner {
	tag: String,
	is_root: bool,
	attributes: RefCell<BTreeMap<String, String>>,
	styles: RefCell<BTreeMap<String, String>>,
	properties: RefCell<BTreeMap<String, Value>>,
	listeners: RefCell<Vec<Listener>>,
	next_listener: Cell<u64>,
	children: RefCell<Vec<Node>>,
	parent: RefCell<Weak<ElementInner>>,
	custom: RefCell<Option<Rc<dyn CustomElementHooks>>>,
}

/// An element node.
#[derive(Clone)]
pub struct Element {
	inner: Rc<ElementInner>,
}

struct TextInner {
	data: RefCell<String>,
	parent: RefCell<Weak<ElementInner>>,
}

/// A text node.
#[derive(Clone)]
pub struct TextNode {
	inner: Rc<TextInner>,
}

/// Any node that can be placed in an element's child list.
#[derive(Clone, PartialEq)]
pub enum Node {
	/// An element.
	Element(Element),
	/// A text node.
	Text(TextNode),
}

impl Element {
	/// Creates a detached element. Custom elements created this way are not
	/// upgraded; use [`crate::Document::create_element`] for that.
	pub fn new(tag: impl Into<String>) -> Self {
		Self::build(tag.into(), false)
	}

	pub(crate) fn new_root(tag: &str) -> Self {
		Self::build(tag.to_string(), true)
	}

	fn build(tag: String, is_root: bool) -> Self {
		Self {
			inner: Rc::new(ElementInner {
				tag,
				is_root,
				attributes: RefCell::new(BTreeMap::new()),
				styles: RefCell::new(BTreeMap::new()),
				properties: RefCell::new(BTreeMap::new()),
				listeners: RefCell::new(Vec::new()),
				next_listener: Cell::new(0),
				children: RefCell::new(Vec::new()),
				parent: RefCell::new(Weak::new()),
				custom: RefCell::new(None),
			}),
		}
	}

	/// Lowercase tag name.
	pub fn tag_name(&self) -> &str {
		&self.inner.tag
	}

	/// Returns `true` if both handles refer to the same element.
	pub fn ptr_eq(&self, other: &Element) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	// Attributes

	/// Sets an attribute.
	pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
		self.inner
			.attributes
			.borrow_mut()
			.insert(name.to_string(), value.into());
	}

	/// Returns an attribute value.
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		self.inner.attributes.borrow().get(name).cloned()
	}

	/// Returns `true` if the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.inner.attributes.borrow().contains_key(name)
	}

	/// Removes an attribute. Missing attributes are ignored.
	pub fn remove_attribute(&self, name: &str) {
		self.inner.attributes.borrow_mut().remove(name);
	}

	/// Attribute names in sorted order.
	pub fn attribute_names(&self) -> Vec<String> {
		self.inner.attributes.borrow().keys().cloned().collect()
	}

	// Inline style

	/// Sets an inline style property. An empty value clears it.
	pub fn set_style_property(&self, property: &str, value: &str) {
		let mut styles = self.inner.styles.borrow_mut();
		if value.is_empty() {
			styles.remove(property);
		} else {
			styles.insert(property.to_string(), value.to_string());
		}
	}

	/// Returns an inline style property value.
	pub fn style_property(&self, property: &str) -> Option<String> {
		self.inner.styles.borrow().get(property).cloned()
	}

	/// Serialized inline style, e.g. `"color: red; width: 10px"`.
	pub fn style_text(&self) -> String {
		self.inner
			.styles
			.borrow()
			.iter()
			.map(|(property, value)| format!("{}: {}", property, value))
			.collect::<Vec<_>>()
			.join("; ")
	}

	// Properties

	/// Sets a DOM property.
	pub fn set_property(&self, name: &str, value: Value) {
		self.inner
			.properties
			.borrow_mut()
			.insert(name.to_string(), value);
	}

	/// Returns a DOM property.
	pub fn property(&self, name: &str) -> Option<Value> {
		self.inner.properties.borrow().get(name).cloned()
	}

	/// Removes a DOM property.
	pub fn remove_property(&self, name: &str) {
		self.inner.properties.borrow_mut().remove(name);
	}

	// Events

	/// Registers a listener for `event_type`.
	pub fn add_event_listener<F>(&self, event_type: &str, handler: F) -> ListenerId
	where
		F: Fn(&Event) + 'static,
	{
		self.add_event_handler(event_type, Rc::new(handler))
	}

	/// Registers a shared listener for `event_type`.
	pub fn add_event_handler(&self, event_type: &str, handler: EventHandler) -> ListenerId {
		let id = ListenerId(self.inner.next_listener.get());
		self.inner.next_listener.set(id.0 + 1);
		self.inner.listeners.borrow_mut().push(Listener {
			id,
			event_type: event_type.to_string(),
			handler,
		});
		id
	}

	/// Removes a listener. Returns `false` if it was not registered.
	pub fn remove_event_listener(&self, id: ListenerId) -> bool {
		let mut listeners = self.inner.listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|listener| listener.id != id);
		listeners.len() != before
	}

	/// Number of listeners registered for `event_type`.
	pub fn listener_count(&self, event_type: &str) -> usize {
		self.inner
			.listeners
			.borrow()
			.iter()
			.filter(|listener| listener.event_type == event_type)
			.count()
	}

	/// Invokes the listeners registered for the event's type, in registration
	/// order. Returns the number of listeners called.
	pub fn dispatch_event(&self, event: &Event) -> usize {
		let handlers: Vec<EventHandler> = self
			.inner
			.listeners
			.borrow()
			.iter()
			.filter(|listener| listener.event_type == event.event_type())
			.map(|listener| Rc::clone(&listener.handler))
			.collect();
		for handler in &handlers {
			handler(event);
		}
		handlers.len()
	}

	// Tree

	/// Parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.inner
			.parent
			.borrow()
			.upgrade()
			.map(|inner| Element { inner })
	}

	/// Snapshot of the child list.
	pub fn children(&self) -> Vec<Node> {
		self.inner.children.borrow().clone()
	}

	/// Number of children.
	pub fn child_count(&self) -> usize {
		self.inner.children.borrow().len()
	}

	/// Returns `true` if the element is attached to a document root.
	pub fn is_connected(&self) -> bool {
		let mut current = Some(self.clone());
		while let Some(element) = current {
			if element.inner.is_root {
				return true;
			}
			current = element.parent();
		}
		false
	}

	/// Returns `true` if `self` is `other` or one of its ancestors.
	pub fn is_inclusive_ancestor_of(&self, other: &Element) -> bool {
		let mut current = Some(other.clone());
		while let Some(element) = current {
			if element.ptr_eq(self) {
				return true;
			}
			current = element.parent();
		}
		false
	}

	/// Concatenated text of all descendant text nodes.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		for child in self.inner.children.borrow().iter() {
			match child {
				Node::Text(text) => out.push_str(&text.data()),
				Node::Element(element) => out.push_str(&element.text_content()),
			}
		}
		out
	}

	/// Appends `child`, moving it from its current parent if needed.
	pub fn append_child(&self, child: impl Into<Node>) -> DomResult<()> {
		let child = child.into();
		self.check_insertable(&child)?;

		let was_connected = child.is_connected();
		let mut failures = Vec::new();
		if let Some(old_parent) = child.parent() {
			old_parent.detach_raw(&child);
			if was_connected {
				failures.extend(run_disconnected(&child));
			}
		}

		child.set_parent(Some(self));
		self.inner.children.borrow_mut().push(child.clone());

		if self.is_connected() {
			failures.extend(run_connected(&child));
		}
		lifecycle_result(failures)
	}

	/// Removes `child` and returns it.
	pub fn remove_child(&self, child: &Node) -> DomResult<Node> {
		let is_child = self
			.inner
			.children
			.borrow()
			.iter()
			.any(|existing| existing == child);
		if !is_child {
			return Err(DomError::NotAChild(self.inner.tag.clone()));
		}

		let was_connected = self.is_connected();
		self.detach_raw(child);
		let failures = if was_connected {
			run_disconnected(child)
		} else {
			Vec::new()
		};
		lifecycle_result(failures).map(|()| child.clone())
	}

	/// Removes all children.
	pub fn clear_children(&self) -> DomResult<()> {
		self.replace_children(Vec::new())
	}

	/// Replaces the child list with `nodes`.
	///
	/// Nodes that are already children stay attached and keep their state; only
	/// removed nodes receive `disconnected` and only newly inserted nodes receive
	/// `connected`. A node listed more than once keeps its last position.
	pub fn replace_children(&self, nodes: Vec<Node>) -> DomResult<()> {
		let nodes = dedup_keep_last(nodes);
		for node in &nodes {
			self.check_insertable(node)?;
		}

		let connected = self.is_connected();
		let old = self.children();
		let mut failures = Vec::new();

		let removed: Vec<Node> = old
			.iter()
			.filter(|node| !nodes.contains(node))
			.cloned()
			.collect();
		for node in &removed {
			self.detach_raw(node);
		}

		let mut inserted = Vec::new();
		for node in &nodes {
			let already_child = old.contains(node);
			if !already_child {
				let node_was_connected = node.is_connected();
				if let Some(old_parent) = node.parent() {
					old_parent.detach_raw(node);
					if node_was_connected {
						failures.extend(run_disconnected(node));
					}
				}
				node.set_parent(Some(self));
				inserted.push(node.clone());
			}
		}
		*self.inner.children.borrow_mut() = nodes;

		if connected {
			for node in &removed {
				failures.extend(run_disconnected(node));
			}
			for node in &inserted {
				failures.extend(run_connected(node));
			}
		}
		lifecycle_result(failures)
	}

	/// Serializes the element and its subtree to HTML.
	pub fn to_html(&self) -> String {
		let mut out = String::new();
		self.write_html(&mut out);
		out
	}

	fn write_html(&self, out: &mut String) {
		out.push('<');
		out.push_str(&self.inner.tag);
		let attributes = self.inner.attributes.borrow();
		for (name, value) in attributes.iter() {
			out.push(' ');
			out.push_str(name);
			out.push_str("=\"");
			out.push_str(&escape_attribute(value));
			out.push('"');
		}
		if !attributes.contains_key("style") && !self.inner.styles.borrow().is_empty() {
			out.push_str(" style=\"");
			out.push_str(&escape_attribute(&self.style_text()));
			out.push('"');
		}
		out.push('>');
		for child in self.inner.children.borrow().iter() {
			match child {
				Node::Element(element) => element.write_html(out),
				Node::Text(text) => out.push_str(&escape_text(&text.data())),
			}
		}
		out.push_str("</");
		out.push_str(&self.inner.tag);
		out.push('>');
	}

	// Custom elements

	/// Attaches custom element callbacks to this element.
	pub fn upgrade(&self, hooks: Rc<dyn CustomElementHooks>) {
		*self.inner.custom.borrow_mut() = Some(hooks);
	}

	/// Returns `true` if the element has custom element callbacks.
	pub fn is_custom(&self) -> bool {
		self.inner.custom.borrow().is_some()
	}

	fn hooks(&self) -> Option<Rc<dyn CustomElementHooks>> {
		self.inner.custom.borrow().clone()
	}

	fn check_insertable(&self, node: &Node) -> DomResult<()> {
		if let Node::Element(element) = node {
			if element.inner.is_root {
				return Err(DomError::HierarchyRequest(
					"a document root cannot be inserted".to_string(),
				));
			}
			if element.is_inclusive_ancestor_of(self) {
				return Err(DomError::HierarchyRequest(format!(
					"<{}> cannot be inserted into itself or its descendant",
					element.tag_name()
				)));
			}
		}
		Ok(())
	}

	fn detach_raw(&self, child: &Node) {
		self.inner
			.children
			.borrow_mut()
			.retain(|existing| existing != child);
		child.set_parent(None);
	}

	fn collect_custom(&self, out: &mut Vec<Element>) {
		if self.is_custom() {
			out.push(self.clone());
		}
		for child in self.inner.children.borrow().iter() {
			if let Node::Element(element) = child {
				element.collect_custom(out);
			}
		}
	}
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Element")
			.field("tag", &self.inner.tag)
			.field("attributes", &self.inner.attributes.borrow())
			.field("children", &self.child_count())
			.finish()
	}
}

impl TextNode {
	/// Creates a detached text node.
	pub fn new(data: impl Into<String>) -> Self {
		Self {
			inner: Rc::new(TextInner {
				data: RefCell::new(data.into()),
				parent: RefCell::new(Weak::new()),
			}),
		}
	}

	/// Current text.
	pub fn data(&self) -> String {
		self.inner.data.borrow().clone()
	}

	/// Replaces the text.
	pub fn set_data(&self, data: impl Into<String>) {
		*self.inner.data.borrow_mut() = data.into();
	}

	/// Parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		self.inner
			.parent
			.borrow()
			.upgrade()
			.map(|inner| Element { inner })
	}

	/// Returns `true` if both handles refer to the same text node.
	pub fn ptr_eq(&self, other: &TextNode) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl PartialEq for TextNode {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl fmt::Debug for TextNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TextNode").field(&self.data()).finish()
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Element(element) => element.fmt(f),
			Self::Text(text) => text.fmt(f),
		}
	}
}

impl Node {
	/// Parent element, if attached.
	pub fn parent(&self) -> Option<Element> {
		match self {
			Self::Element(element) => element.parent(),
			Self::Text(text) => text.parent(),
		}
	}

	/// Returns `true` if the node is attached to a document root.
	pub fn is_connected(&self) -> bool {
		match self {
			Self::Element(element) => element.is_connected(),
			Self::Text(text) => text.parent().is_some_and(|parent| parent.is_connected()),
		}
	}

	/// The element, if this node is one.
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(element) => Some(element),
			Self::Text(_) => None,
		}
	}

	/// The text node, if this node is one.
	pub fn as_text(&self) -> Option<&TextNode> {
		match self {
			Self::Text(text) => Some(text),
			Self::Element(_) => None,
		}
	}

	/// Serializes the node to HTML.
	pub fn to_html(&self) -> String {
		match self {
			Self::Element(element) => element.to_html(),
			Self::Text(text) => escape_text(&text.data()),
		}
	}

	fn set_parent(&self, parent: Option<&Element>) {
		let weak = parent.map_or_else(Weak::new, |parent| Rc::downgrade(&parent.inner));
		match self {
			Self::Element(element) => *element.inner.parent.borrow_mut() = weak,
			Self::Text(text) => *text.inner.parent.borrow_mut() = weak,
		}
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl From<&Element> for Node {
	fn from(element: &Element) -> Self {
		Self::Element(element.clone())
	}
}

impl From<TextNode> for Node {
	fn from(text: TextNode) -> Self {
		Self::Text(text)
	}
}

impl From<&TextNode> for Node {
	fn from(text: &TextNode) -> Self {
		Self::Text(text.clone())
	}
}

fn custom_elements_in(node: &Node) -> Vec<Element> {
	let mut out = Vec::new();
	if let Node::Element(element) = node {
		element.collect_custom(&mut out);
	}
	out
}

fn run_connected(node: &Node) -> Vec<LifecycleFailure> {
	let mut failures = Vec::new();
	for element in custom_elements_in(node) {
		// An earlier callback may have detached this element again.
		if !element.is_connected() {
			continue;
		}
		if let Some(hooks) = element.hooks() {
			if let Err(error) = hooks.connected(&element) {
				failures.push(failure(&element, LifecyclePhase::Connected, &*error));
			}
		}
	}
	failures
}

fn run_disconnected(node: &Node) -> Vec<LifecycleFailure> {
	let mut failures = Vec::new();
	for element in custom_elements_in(node) {
		if let Some(hooks) = element.hooks() {
			if let Err(error) = hooks.disconnected(&element) {
				failures.push(failure(&element, LifecyclePhase::Disconnected, &*error));
			}
		}
	}
	failures
}

fn failure(
	element: &Element,
	phase: LifecyclePhase,
	error: &dyn std::error::Error,
) -> LifecycleFailure {
	tracing::error!(
		tag = element.tag_name(),
		%phase,
		error = %error,
		"custom element lifecycle callback failed"
	);
	LifecycleFailure {
		tag: element.tag_name().to_string(),
		phase,
		message: error.to_string(),
	}
}

fn lifecycle_result(failures: Vec<LifecycleFailure>) -> DomResult<()> {
	if failures.is_empty() {
		Ok(())
	} else {
		Err(DomError::Lifecycle(failures))
	}
}

fn dedup_keep_last(nodes: Vec<Node>) -> Vec<Node> {
	let mut unique: Vec<Node> = Vec::with_capacity(nodes.len());
	for node in nodes.into_iter().rev() {
		if !unique.contains(&node) {
			unique.push(node);
		}
	}
	unique.reverse();
	unique
}

fn escape_text(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
	value.replace('&', "&amp;").replace('"', "&quot;")
}
