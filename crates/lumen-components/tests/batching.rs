//! Update batching: any number of triggers in one turn produce one render.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_components::{
	ComponentDefinition, ComponentInstance, StateSetter, UseObservableOptions, component_instance,
	define_component,
};
use lumen_core::{Injector, ObservableValue, flush_microtasks};
use lumen_dom::Document;
use proptest::prelude::*;
use rstest::rstest;

#[derive(Debug, Clone)]
enum Trigger {
	SetCount(i64),
	SetLabel(String),
	SetObservable(i64),
	Schedule,
}

fn trigger_strategy() -> impl Strategy<Value = Trigger> {
	prop_oneof![
		any::<i64>().prop_map(Trigger::SetCount),
		"[a-z]{0,8}".prop_map(Trigger::SetLabel),
		any::<i64>().prop_map(Trigger::SetObservable),
		Just(Trigger::Schedule),
	]
}

type Setters = Rc<RefCell<Option<(StateSetter<i64>, StateSetter<String>)>>>;

struct Fixture {
	_document: Document,
	instance: ComponentInstance,
	setters: Setters,
	shared: ObservableValue<i64>,
}

fn fixture() -> Fixture {
	let setters: Setters = Rc::default();
	let shared = ObservableValue::new(0_i64);
	let definition = ComponentDefinition::builder("x-batched")
		.render({
			let setters = Rc::clone(&setters);
			let shared = shared.clone();
			move |ctx| {
				let (count, set_count) = ctx.use_state("count", 0_i64)?;
				let (label, set_label) = ctx.use_state("label", String::new())?;
				let (remote, _) =
					ctx.use_observable("remote", &shared, UseObservableOptions::new())?;
				*setters.borrow_mut() = Some((set_count, set_label));
				Ok(format!("{}|{}|{}", count, label, remote))
			}
		})
		.build()
		.unwrap();

	let document = Document::new();
	define_component(&document, definition, &Injector::new()).unwrap();
	let host = document.create_element("x-batched");
	document.body().append_child(&host).unwrap();

	Fixture {
		instance: component_instance(&host).unwrap(),
		_document: document,
		setters,
		shared,
	}
}

proptest! {
	#[test]
	fn test_one_render_per_turn(triggers in proptest::collection::vec(trigger_strategy(), 1..20)) {
		let fixture = fixture();
		let (set_count, set_label) = fixture.setters.borrow().clone().unwrap();
		let mut expected = (0_i64, String::new(), 0_i64);
		let mut observable_changed = false;
		let mut any_trigger = false;

		for trigger in &triggers {
			match trigger {
				Trigger::SetCount(value) => {
					set_count.set(*value);
					expected.0 = *value;
					any_trigger = true;
				}
				Trigger::SetLabel(value) => {
					set_label.set(value.clone());
					expected.1 = value.clone();
					any_trigger = true;
				}
				Trigger::SetObservable(value) => {
					if *value != expected.2 {
						observable_changed = true;
					}
					fixture.shared.set_value(*value).unwrap();
					expected.2 = *value;
				}
				Trigger::Schedule => {
					fixture.instance.schedule_update();
					any_trigger = true;
				}
			}
		}
		let rendered_before = fixture.instance.render_count();
		let report = flush_microtasks();

		prop_assert!(report.is_clean());
		prop_assert_eq!(rendered_before, 1);
		let expected_renders = if any_trigger || observable_changed { 2 } else { 1 };
		prop_assert_eq!(fixture.instance.render_count(), expected_renders);
		prop_assert_eq!(
			fixture.instance.host().text_content(),
			format!("{}|{}|{}", expected.0, expected.1, expected.2)
		);

		fixture.instance.unmount().unwrap();
	}
}

#[rstest]
fn test_update_component_renders_immediately_despite_pending_batch() {
	let fixture = fixture();
	let (set_count, _) = fixture.setters.borrow().clone().unwrap();
	set_count.set(4);

	fixture.instance.update_component().unwrap();

	assert_eq!(fixture.instance.render_count(), 2);
	assert_eq!(fixture.instance.host().text_content(), "4||0");
	flush_microtasks();
	assert_eq!(fixture.instance.render_count(), 3);
}

#[rstest]
fn test_triggers_after_disconnect_render_nothing() {
	let fixture = fixture();
	let (set_count, set_label) = fixture.setters.borrow().clone().unwrap();
	fixture.instance.unmount().unwrap();

	set_count.set(1);
	set_label.set("late".to_string());
	for _ in 0..5 {
		fixture.instance.schedule_update();
	}
	fixture.shared.set_value(9).unwrap();
	let report = flush_microtasks();

	assert!(report.is_clean());
	assert_eq!(fixture.instance.render_count(), 1);
	assert_eq!(fixture.shared.observer_count(), 0);
}
