//! Shared cancellation flag polled by the process supervisor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot cancellation flag shared between a session and its in-flight
/// operations.
///
/// Set once by the caller's abort path and read by every supervisor poll
/// tick. The flag never resets; a session that has aborted stays aborted,
/// and a new job gets a new flag with its new session.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests cancellation of any operation polling this flag.
	pub fn set(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_set(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}
