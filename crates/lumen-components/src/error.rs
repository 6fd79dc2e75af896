//! Component error types.

use lumen_core::{AggregateDisposeError, CoreError};
use lumen_dom::DomError;
use thiserror::Error;

/// Result type for component operations.
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Errors raised by the component runtime.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ComponentError {
	/// The definition failed validation.
	#[error("invalid component definition: {0}")]
	InvalidDefinition(String),

	/// A state, ref or resource key holds a value of another type.
	#[error("key `{key}` does not hold a value of type {expected}")]
	StateTypeMismatch {
		/// The hook key.
		key: String,
		/// The requested type.
		expected: &'static str,
	},

	/// `update_component` was called from inside the same instance's render.
	#[error("<{0}> is already rendering")]
	ReentrantRender(String),

	/// A user callback (`render`, `compare_state`, `constructed`, ...) failed.
	#[error("render failed: {0}")]
	Render(String),

	/// One or more resources failed to dispose.
	#[error(transparent)]
	Disposal(#[from] AggregateDisposeError),

	/// A core primitive failed, typically because it was already disposed.
	#[error(transparent)]
	Core(#[from] CoreError),

	/// A DOM operation failed.
	#[error(transparent)]
	Dom(#[from] DomError),
}

impl ComponentError {
	/// Builds a [`ComponentError::Render`] from any displayable error.
	pub fn render(error: impl std::fmt::Display) -> Self {
		Self::Render(error.to_string())
	}

	pub(crate) fn type_mismatch<T>(key: &str) -> Self {
		Self::StateTypeMismatch {
			key: key.to_string(),
			expected: std::any::type_name::<T>(),
		}
	}

	/// Returns `true` when the error comes from a disposed resource.
	pub fn is_already_disposed(&self) -> bool {
		matches!(self, Self::Core(core) if core.is_already_disposed())
	}
}
