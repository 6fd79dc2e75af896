//! Core error types.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CoreError {
	/// A read or write was attempted on a torn-down resource.
	#[error("{0}: Already Disposed")]
	AlreadyDisposed(&'static str),

	/// Runtime configuration could not be parsed.
	#[error("invalid runtime configuration: {0}")]
	Config(String),
}

impl CoreError {
	/// Returns `true` for the already-disposed error kind.
	pub fn is_already_disposed(&self) -> bool {
		matches!(self, Self::AlreadyDisposed(_))
	}
}
