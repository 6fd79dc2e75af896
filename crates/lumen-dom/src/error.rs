//! DOM error types.

use std::fmt;

use thiserror::Error;

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Lifecycle callback that failed during a tree mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
	/// `connected` callback.
	Connected,
	/// `disconnected` callback.
	Disconnected,
}

impl fmt::Display for LifecyclePhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Connected => f.write_str("connected"),
			Self::Disconnected => f.write_str("disconnected"),
		}
	}
}

/// One failed lifecycle callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleFailure {
	/// Tag name of the custom element.
	pub tag: String,
	/// Callback that failed.
	pub phase: LifecyclePhase,
	/// Error reported by the callback.
	pub message: String,
}

impl fmt::Display for LifecycleFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<{}> {} callback: {}", self.tag, self.phase, self.message)
	}
}

/// DOM errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DomError {
	/// Insertion would create a cycle or target a non-container.
	#[error("hierarchy request error: {0}")]
	HierarchyRequest(String),

	/// The node is not a child of the element.
	#[error("node is not a child of <{0}>")]
	NotAChild(String),

	/// Custom element names must be lowercase and contain a hyphen.
	#[error("invalid custom element name: {0:?}")]
	InvalidCustomElementName(String),

	/// A custom element with this name is already registered.
	#[error("custom element already defined: {0}")]
	AlreadyDefined(String),

	/// One or more lifecycle callbacks failed; the mutation itself completed.
	#[error("{} lifecycle callback(s) failed: {}", .0.len(), join_failures(.0))]
	Lifecycle(Vec<LifecycleFailure>),
}

fn join_failures(failures: &[LifecycleFailure]) -> String {
	failures
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}
