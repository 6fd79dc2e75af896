//! Runtime primitives module.
//!
//! This module provides access to the disposable contract, observable values,
//! the microtask queue, injector scopes and runtime configuration.
//!
//! # Examples
//!
//! ```rust
//! use lumen::core::{ObservableValue, flush_microtasks};
//!
//! let count = ObservableValue::new(1);
//! count.set_value(2).unwrap();
//! assert_eq!(count.get_value().unwrap(), 2);
//! assert_eq!(flush_microtasks().tasks_run, 0);
//! ```

pub use lumen_core::*;
