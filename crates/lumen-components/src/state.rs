//! Per-instance state record.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::{ComponentError, ComponentResult};

/// String-keyed, heterogeneously typed state of one component instance.
///
/// Each key holds a value of a single type; reading it as another type fails
/// with [`ComponentError::StateTypeMismatch`].
#[derive(Default)]
pub struct StateRecord {
	values: HashMap<String, Box<dyn Any>>,
}

impl StateRecord {
	/// Creates an empty record.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert, handy in `initial_state` callbacks.
	///
	/// ```
	/// use lumen_components::StateRecord;
	///
	/// let state = StateRecord::new().with("count", 0).with("name", "x".to_string());
	/// assert_eq!(state.get::<i32>("count").unwrap(), Some(0));
	/// ```
	pub fn with<T: 'static>(mut self, key: &str, value: T) -> Self {
		self.insert(key, value);
		self
	}

	/// Stores `value` under `key`, replacing any previous value.
	pub fn insert<T: 'static>(&mut self, key: &str, value: T) {
		self.values.insert(key.to_string(), Box::new(value));
	}

	/// Returns a clone of the value under `key`.
	pub fn get<T: Clone + 'static>(&self, key: &str) -> ComponentResult<Option<T>> {
		match self.values.get(key) {
			Some(value) => value
				.downcast_ref::<T>()
				.cloned()
				.map(Some)
				.ok_or_else(|| ComponentError::type_mismatch::<T>(key)),
			None => Ok(None),
		}
	}

	/// Returns `true` if `key` holds a value.
	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	/// Removes the value under `key`.
	pub fn remove(&mut self, key: &str) -> bool {
		self.values.remove(key).is_some()
	}

	/// Number of keys.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Returns `true` when the record is empty.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Keys in sorted order.
	pub fn keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self.values.keys().cloned().collect();
		keys.sort();
		keys
	}
}

impl fmt::Debug for StateRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StateRecord")
			.field("keys", &self.keys())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_get_returns_stored_value() {
		let mut state = StateRecord::new();
		state.insert("count", 3_u32);

		assert_eq!(state.get::<u32>("count").unwrap(), Some(3));
		assert_eq!(state.get::<u32>("missing").unwrap(), None);
	}

	#[rstest]
	fn test_get_with_wrong_type_fails() {
		let state = StateRecord::new().with("count", 3_u32);

		assert_eq!(
			state.get::<String>("count").unwrap_err(),
			ComponentError::StateTypeMismatch {
				key: "count".to_string(),
				expected: std::any::type_name::<String>(),
			}
		);
	}

	#[rstest]
	fn test_insert_replaces_and_may_change_type() {
		let mut state = StateRecord::new().with("value", 1_i32);
		state.insert("value", "one".to_string());

		assert_eq!(state.get::<String>("value").unwrap().as_deref(), Some("one"));
		assert_eq!(state.len(), 1);
		assert!(state.remove("value"));
		assert!(state.is_empty());
	}
}
