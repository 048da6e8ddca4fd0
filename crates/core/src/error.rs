//! Error taxonomy for build and flash operations.

use std::io;

use ino_runtime::SupervisorError;
use thiserror::Error;

/// Failure reasons carried by [`Outcome::Failed`](crate::Outcome::Failed).
///
/// The exit-table variants keep the toolchain's human-readable reasons as
/// their display strings so a consumer that only watches the output stream
/// still sees the same wording the typed outcome carries.
#[derive(Debug, Error)]
pub enum UploadError {
	/// Sketch workspace could not be written; nothing was spawned.
	#[error("failed to write sketch workspace: {0}")]
	WorkspaceWrite(#[source] io::Error),

	/// The toolchain child process could not be started or awaited.
	#[error(transparent)]
	Supervisor(#[from] SupervisorError),

	#[error("build failed")]
	BuildFailed,

	#[error("sketch not found")]
	SketchNotFound,

	#[error("invalid command-line option")]
	InvalidCliOption,

	#[error("unknown preference")]
	UnknownPreference,

	#[error("flash failed")]
	FlashFailed,

	/// Exit code outside the operation's table.
	#[error("unknown error")]
	UnknownExit,

	/// The board profile names no firmware file to flash.
	#[error("no firmware file configured for this board")]
	FirmwareNotConfigured,

	/// A per-platform fqbn map has no entry for the host platform.
	#[error("no fqbn configured for host platform `{0}`")]
	UnsupportedPlatform(String),

	#[error("invalid board profile: {0}")]
	InvalidProfile(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exit_table_reasons_keep_their_wording() {
		assert_eq!(UploadError::BuildFailed.to_string(), "build failed");
		assert_eq!(UploadError::SketchNotFound.to_string(), "sketch not found");
		assert_eq!(UploadError::InvalidCliOption.to_string(), "invalid command-line option");
		assert_eq!(UploadError::UnknownPreference.to_string(), "unknown preference");
		assert_eq!(UploadError::FlashFailed.to_string(), "flash failed");
		assert_eq!(UploadError::UnknownExit.to_string(), "unknown error");
	}
}
