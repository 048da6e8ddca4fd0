//! Upload session tying a peripheral to a board profile.

mod build;
mod flash;

use std::path::Path;
use std::sync::Arc;

use ino_runtime::{
	CancelFlag, OutputChunk, OutputSink, OutputTag, Supervisor, Terminator, host_terminator,
};
use tracing::{debug, info};

use crate::board::BoardProfile;
use crate::error::UploadError;
use crate::outcome::Outcome;
use crate::paths::SessionPaths;

/// One (peripheral, board profile) pairing and its session-scoped state.
///
/// A session is constructed per upload job. Its cancellation flag is
/// one-shot: once [`Session::abort`] has fired, later build/flash calls on
/// the same session resolve `Aborted`; a new job gets a new session.
pub struct Session {
	peripheral_path: String,
	fqbn: String,
	profile: BoardProfile,
	paths: SessionPaths,
	cancel: CancelFlag,
	terminator: Box<dyn Terminator>,
	sink: Arc<dyn OutputSink>,
}

impl Session {
	/// Builds a session, resolving the profile's fqbn for the host platform
	/// and deriving the session-scoped workspace paths.
	pub fn new(
		peripheral_path: impl Into<String>,
		profile: BoardProfile,
		user_data_dir: &Path,
		tools_dir: &Path,
		sink: Arc<dyn OutputSink>,
	) -> Result<Self, UploadError> {
		let peripheral_path = peripheral_path.into();
		let fqbn = profile.fqbn.resolve()?.to_string();
		let paths = SessionPaths::new(user_data_dir, tools_dir, &fqbn);
		info!(target = "ino.session", %fqbn, peripheral = %peripheral_path, "session created");

		Ok(Self {
			peripheral_path,
			fqbn,
			profile,
			paths,
			cancel: CancelFlag::new(),
			terminator: host_terminator(),
			sink,
		})
	}

	/// Requests cancellation of any in-flight build or flash.
	///
	/// Observed by the supervisor's poll loop within one poll interval.
	pub fn abort(&self) {
		debug!(target = "ino.session", peripheral = %self.peripheral_path, "abort requested");
		self.cancel.set();
	}

	pub fn is_aborted(&self) -> bool {
		self.cancel.is_set()
	}

	pub fn peripheral_path(&self) -> &str {
		&self.peripheral_path
	}

	/// The fqbn resolved for the host platform at construction.
	pub fn fqbn(&self) -> &str {
		&self.fqbn
	}

	pub fn paths(&self) -> &SessionPaths {
		&self.paths
	}

	fn supervisor(&self) -> Supervisor<'_> {
		Supervisor::new(&self.cancel, self.terminator.as_ref())
	}

	fn send(&self, chunk: OutputChunk) {
		self.sink.send(chunk);
	}

	/// Surfaces a failure both as an error-tagged line on the sink and as
	/// the returned outcome, so stream-only consumers see the reason too.
	fn fail(&self, err: UploadError) -> Outcome {
		self.send(OutputChunk::new(format!("{err}\n"), OutputTag::Error));
		Outcome::Failed(err)
	}
}


#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::testutil::Collector;
	use super::*;

	fn collector_session(tmp: &TempDir) -> (Session, Arc<Collector>) {
		let sink = Arc::new(Collector::default());
		let profile =
			BoardProfile::from_json(r#"{ "fqbn": "arduino:avr:uno" }"#).expect("profile should parse");
		let session = Session::new(
			"/dev/ttyACM0",
			profile,
			&tmp.path().join("data"),
			&tmp.path().join("tools"),
			sink.clone(),
		)
		.expect("session should build");
		(session, sink)
	}

	#[test]
	fn fail_surfaces_the_reason_on_the_sink() {
		let tmp = TempDir::new().expect("temp dir should be created");
		let (session, sink) = collector_session(&tmp);

		let outcome = session.fail(UploadError::FlashFailed);
		assert!(matches!(outcome, Outcome::Failed(UploadError::FlashFailed)));

		let chunks = sink.0.lock().expect("collector lock should not be poisoned").clone();
		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].tag, OutputTag::Error);
		assert_eq!(chunks[0].text, "flash failed\n");
	}

	#[test]
	fn abort_is_observable_and_sticky() {
		let tmp = TempDir::new().expect("temp dir should be created");
		let (session, _) = collector_session(&tmp);

		assert!(!session.is_aborted());
		session.abort();
		assert!(session.is_aborted());
		session.abort();
		assert!(session.is_aborted());
	}
}
