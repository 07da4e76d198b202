//! Error types for graph, inference and persistence operations.

/// Errors surfaced by the concept graph and its persistence layer.
///
/// Every failing mutation leaves the graph exactly as it was before the call.
/// Fuzzy inference never produces an error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
	/// A concept name was referenced that does not exist.
	#[error("Concept not found: {0}")]
	NotFound(String),

	/// A concept with this name already exists.
	#[error("Concept already exists: {0}")]
	DuplicateName(String),

	/// Arguments were rejected (too few parents, bad vectors, bad dimension, ...).
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Persisted state parsed but is inconsistent (dangling edges, wrong dimension, ...).
	#[error("Malformed graph state: {0}")]
	MalformedState(String),

	/// Persisted state could not be parsed or produced.
	#[error("Failed to (de)serialize graph state: {0}")]
	Serialization(#[from] serde_json::Error),

	/// I/O error while reading or writing persisted state.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl CoreError {
	/// Check if this error refers to an unknown concept.
	#[must_use]
	pub const fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}

	/// Check if this error came from reading persisted state.
	#[must_use]
	pub const fn is_load_failure(&self) -> bool {
		matches!(self, Self::MalformedState(_) | Self::Serialization(_) | Self::Io(_))
	}

	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidArgument(message.into())
	}
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
