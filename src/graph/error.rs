//! Error types for graph construction and mutation.

use thiserror::Error;

/// Result alias used by every fallible graph operation.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the graph model, its engines and the payload loader.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The payload or an argument is structurally unusable.
	#[error("Invalid input: {0}")]
	InvalidInput(String),

	/// A node reference names something that is neither a vertex nor a group.
	#[error("Type mismatch: {0} is neither a vertex nor a group")]
	TypeMismatch(String),

	/// An arena index or payload id does not resolve to a live entity.
	#[error("Unknown {kind} {index}")]
	UnknownNode {
		/// Entity namespace ("vertex", "group" or "edge").
		kind: &'static str,
		/// Offending index or payload id.
		index: i64,
	},

	/// Payload text is not valid JSON for the expected shape.
	#[error("Malformed payload: {0}")]
	Json(#[from] serde_json::Error),
}

impl GraphError {
	/// Create an InvalidInput error.
	pub fn invalid_input(message: impl Into<String>) -> Self {
		Self::InvalidInput(message.into())
	}

	pub(crate) fn unknown(kind: &'static str, index: impl TryInto<i64>) -> Self {
		Self::UnknownNode {
			kind,
			index: index.try_into().unwrap_or(i64::MAX),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_name_the_offending_value() {
		assert_eq!(
			GraphError::invalid_input("missing vertices").to_string(),
			"Invalid input: missing vertices"
		);
		assert_eq!(
			GraphError::TypeMismatch("edge-3".into()).to_string(),
			"Type mismatch: edge-3 is neither a vertex nor a group"
		);
		assert_eq!(
			GraphError::unknown("group", 7usize).to_string(),
			"Unknown group 7"
		);
	}

	#[test]
	fn json_errors_convert() {
		let err: GraphError = serde_json::from_str::<u32>("nope").unwrap_err().into();
		assert!(matches!(err, GraphError::Json(_)));
	}
}
