//! Error types for name allocation.
//!
//! Every failure in the allocator is a typed, recoverable result; nothing in
//! this crate aborts the process.

use std::time::Duration;
use thiserror::Error;

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors that can occur while allocating or persisting names.
#[derive(Debug, Error)]
pub enum AllocError {
	/// Bad or missing questionnaire input, surfaced before allocation runs.
	#[error("invalid answers: {0}")]
	Validation(String),

	/// A composed name collided with an existing registry entry. The whole
	/// batch is rejected; nothing was written.
	#[error("name(s) already registered: {}", .names.join(", "))]
	Duplicate { names: Vec<String> },

	/// The registry lock could not be acquired in time. Transient; safe to
	/// retry.
	#[error("registry busy: lock not acquired within {waited:?}")]
	Busy { waited: Duration },

	/// A batch append failed partway through. `committed` names are on disk;
	/// `missing` names are not and may be retried without re-allocating.
	#[error("partial write: {} of {} names persisted", .committed.len(), .committed.len() + .missing.len())]
	Persistence {
		committed: Vec<String>,
		missing: Vec<String>,
		#[source]
		source: csv::Error,
	},

	/// I/O failure outside a batch append (opening files, locking).
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Malformed registry or reference data.
	#[error("registry data error: {0}")]
	Csv(#[from] csv::Error),
}

impl AllocError {
	/// Whether the caller may simply retry the same request.
	pub fn is_transient(&self) -> bool {
		matches!(self, AllocError::Busy { .. })
	}
}
