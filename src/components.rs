//! Component runtime module.
//!
//! This module provides access to lumen-components:
//!
//! - **Definitions and instances**: custom element components with lifecycle callbacks
//! - **Hooks**: `use_state`, `use_observable`, `use_disposable`, `use_ref`, `use_host_props`
//! - **Scheduling**: microtask-batched `schedule_update` and immediate `update_component`
//! - **Reactive bindings**: text, attribute, style and property bindings to observables

#[cfg(feature = "components")]
pub use lumen_components::*;
