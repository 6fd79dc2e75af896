//! Custom element glue.
//!
//! [`define_component`] registers a definition with a document's custom
//! element registry. Each upgraded element then creates a fresh
//! [`ComponentInstance`] when it is connected and unmounts it when it is
//! disconnected; reconnecting creates a new instance.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lumen_core::Injector;
use lumen_dom::{CustomElementFactory, CustomElementHooks, Document, Element, LifecycleError};

use crate::definition::ComponentDefinition;
use crate::error::ComponentResult;
use crate::instance::{ComponentInstance, InstanceInner};

thread_local! {
	static LIVE_INSTANCES: RefCell<Vec<(Element, Weak<InstanceInner>)>> = const { RefCell::new(Vec::new()) };
}

/// Registers `definition` under its tag in `document`'s registry.
///
/// Instances resolve services through `injector` (or a child scope of it when
/// the definition asks for one).
pub fn define_component(
	document: &Document,
	definition: ComponentDefinition,
	injector: &Injector,
) -> ComponentResult<()> {
	let tag = definition.tag().to_string();
	let factory = ComponentFactory {
		definition,
		injector: injector.clone(),
	};
	document.registry().define(&tag, Rc::new(factory))?;
	Ok(())
}

/// The instance currently mounted on `host`, if any.
pub fn component_instance(host: &Element) -> Option<ComponentInstance> {
	LIVE_INSTANCES.with(|live| {
		live.borrow()
			.iter()
			.find(|(element, _)| element.ptr_eq(host))
			.and_then(|(_, inner)| ComponentInstance::from_weak(inner))
	})
}

struct ComponentFactory {
	definition: ComponentDefinition,
	injector: Injector,
}

impl CustomElementFactory for ComponentFactory {
	fn upgrade(&self, _host: &Element) -> Rc<dyn CustomElementHooks> {
		Rc::new(ComponentElement {
			definition: self.definition.clone(),
			injector: self.injector.clone(),
			instance: RefCell::new(None),
		})
	}
}

struct ComponentElement {
	definition: ComponentDefinition,
	injector: Injector,
	instance: RefCell<Option<ComponentInstance>>,
}

impl CustomElementHooks for ComponentElement {
	fn connected(&self, host: &Element) -> Result<(), LifecycleError> {
		if self.instance.borrow().is_some() {
			return Ok(());
		}
		let instance = ComponentInstance::new(&self.definition, host, &self.injector)?;
		*self.instance.borrow_mut() = Some(instance.clone());
		LIVE_INSTANCES.with(|live| {
			live.borrow_mut()
				.push((host.clone(), Rc::downgrade(&instance.inner)));
		});
		instance.mount()?;
		Ok(())
	}

	fn disconnected(&self, host: &Element) -> Result<(), LifecycleError> {
		let Some(instance) = self.instance.borrow_mut().take() else {
			return Ok(());
		};
		LIVE_INSTANCES.with(|live| {
			live.borrow_mut().retain(|(element, _)| !element.ptr_eq(host));
		});
		instance.unmount()?;
		Ok(())
	}
}
