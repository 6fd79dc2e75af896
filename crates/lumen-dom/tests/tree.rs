//! Document tree behavior seen from outside the crate.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_dom::{
	CustomElementFactory, CustomElementHooks, Document, DomError, Element, Event, LifecycleError,
	Node,
};
use rstest::{fixture, rstest};
use serde_json::json;

type Log = Rc<RefCell<Vec<String>>>;

struct Logging {
	log: Log,
}

impl CustomElementHooks for Logging {
	fn connected(&self, host: &Element) -> Result<(), LifecycleError> {
		self.log
			.borrow_mut()
			.push(format!("connected {}", host.tag_name()));
		Ok(())
	}

	fn disconnected(&self, host: &Element) -> Result<(), LifecycleError> {
		self.log
			.borrow_mut()
			.push(format!("disconnected {}", host.tag_name()));
		Ok(())
	}
}

struct LoggingFactory {
	log: Log,
}

impl CustomElementFactory for LoggingFactory {
	fn upgrade(&self, _host: &Element) -> Rc<dyn CustomElementHooks> {
		Rc::new(Logging {
			log: Rc::clone(&self.log),
		})
	}
}

#[fixture]
fn document_with_log() -> (Document, Log) {
	let log: Log = Rc::default();
	let document = Document::new();
	for tag in ["x-outer", "x-inner"] {
		document
			.registry()
			.define(
				tag,
				Rc::new(LoggingFactory {
					log: Rc::clone(&log),
				}),
			)
			.unwrap();
	}
	(document, log)
}

#[rstest]
fn test_subtree_lifecycle_runs_in_tree_order(document_with_log: (Document, Log)) {
	let (document, log) = document_with_log;
	let outer = document.create_element("x-outer");
	let wrapper = document.create_element("div");
	let inner = document.create_element("x-inner");
	wrapper.append_child(&inner).unwrap();
	outer.append_child(&wrapper).unwrap();
	assert!(log.borrow().is_empty());

	document.body().append_child(&outer).unwrap();
	document.body().remove_child(&Node::from(&outer)).unwrap();

	assert_eq!(
		*log.borrow(),
		vec![
			"connected x-outer",
			"connected x-inner",
			"disconnected x-outer",
			"disconnected x-inner",
		]
	);
}

#[rstest]
fn test_markup_reflects_attributes_styles_and_text() {
	let document = Document::new();
	let card = document.create_element("DIV");
	card.set_attribute("title", "a \"quoted\" & title");
	card.set_style_property("color", "red");
	card.set_property("payload", json!({"id": 1}));
	card.append_child(&document.create_text_node("1 < 2")).unwrap();

	assert_eq!(
		card.to_html(),
		"<div title=\"a &quot;quoted&quot; &amp; title\" style=\"color: red\">1 &lt; 2</div>"
	);
	assert_eq!(card.property("payload"), Some(json!({"id": 1})));
}

#[rstest]
fn test_listeners_can_be_removed_by_id() {
	let element = Element::new("button");
	let clicks = Rc::new(RefCell::new(0));
	let id = element.add_event_listener("click", {
		let clicks = Rc::clone(&clicks);
		move |_: &Event| *clicks.borrow_mut() += 1
	});

	assert_eq!(element.dispatch_event(&Event::new("click")), 1);
	assert!(element.remove_event_listener(id));
	assert_eq!(element.dispatch_event(&Event::new("click")), 0);
	assert_eq!(*clicks.borrow(), 1);
}

#[rstest]
fn test_inserting_an_ancestor_into_its_descendant_fails() {
	let document = Document::new();
	let parent = document.create_element("section");
	let child = document.create_element("p");
	parent.append_child(&child).unwrap();

	let err = child.append_child(&parent).unwrap_err();

	assert!(matches!(err, DomError::HierarchyRequest(_)));
	assert!(parent.parent().is_none());
}
