//! Child-process supervision: output relay, cancellation polling, exit
//! mapping.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::cancel::CancelFlag;
use crate::stream::{Classifier, OutputChunk, OutputSink, StreamOrigin};
use crate::terminate::Terminator;

/// How often an in-flight operation checks the cancellation flag.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

const READ_BUF_SIZE: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
	#[error("failed to spawn {tool}: {source}")]
	Spawn {
		tool: String,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to await {tool}: {source}")]
	Wait {
		tool: String,
		#[source]
		source: std::io::Error,
	},
}

/// How the child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
	/// The child exited on its own and reported a status code.
	Code(i32),
	/// The child was killed before it could report a code. A forced kill
	/// never reports a normal code, so this maps to an aborted outcome
	/// whether or not the cancel flag was the trigger.
	Killed,
}

/// Runs one child process to completion, relaying classified output.
///
/// Created per invocation; the cancellation flag and termination strategy
/// are borrowed from the owning session.
pub struct Supervisor<'a> {
	cancel: &'a CancelFlag,
	terminator: &'a dyn Terminator,
}

impl<'a> Supervisor<'a> {
	pub fn new(cancel: &'a CancelFlag, terminator: &'a dyn Terminator) -> Self {
		Self { cancel, terminator }
	}

	/// Spawns `executable` with `args` and supervises it until exit.
	///
	/// Every received chunk is classified and forwarded to `sink` before the
	/// next read; ordering within each stream is preserved and no chunk is
	/// dropped. The cancellation flag is polled every
	/// [`CANCEL_POLL_INTERVAL`], with at most one termination attempt per
	/// tick while the child is alive. The loop resolves on child exit, not
	/// on stream EOF, so an orphaned grandchild holding the pipes cannot
	/// stall the operation. After the child truly exits the final clear
	/// chunk is emitted exactly once, before this method returns.
	pub async fn run(
		&self,
		executable: &Path,
		args: &[String],
		classifier: &mut dyn Classifier,
		sink: &dyn OutputSink,
	) -> Result<ProcessExit, SupervisorError> {
		let tool = executable.display().to_string();
		let mut child = Command::new(executable)
			.args(args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|source| SupervisorError::Spawn { tool: tool.clone(), source })?;

		let pid = child.id();
		debug!(target = "ino.supervisor", tool = %tool, pid, "child spawned");

		let mut stdout = child.stdout.take();
		let mut stderr = child.stderr.take();
		let mut stdout_buf = [0u8; READ_BUF_SIZE];
		let mut stderr_buf = [0u8; READ_BUF_SIZE];

		// The first tick completes immediately, so an abort requested before
		// the spawn is observed without waiting a full interval.
		let mut poll = tokio::time::interval(CANCEL_POLL_INTERVAL);
		poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

		// Biased order: pending output is always relayed before the exit or
		// the poll tick is taken, so a fast-exiting child cannot race its
		// buffered output out of the stream.
		let status = loop {
			tokio::select! {
				biased;
				chunk = next_chunk(&mut stdout, &mut stdout_buf), if stdout.is_some() => {
					if let Some(text) = chunk {
						for span in classifier.classify(StreamOrigin::Stdout, &text) {
							sink.send(span);
						}
					}
				}
				chunk = next_chunk(&mut stderr, &mut stderr_buf), if stderr.is_some() => {
					if let Some(text) = chunk {
						for span in classifier.classify(StreamOrigin::Stderr, &text) {
							sink.send(span);
						}
					}
				}
				status = child.wait() => {
					break status.map_err(|source| SupervisorError::Wait { tool: tool.clone(), source })?;
				}
				_ = poll.tick() => {
					if self.cancel.is_set() {
						if let Some(pid) = pid {
							debug!(target = "ino.supervisor", pid, "cancel requested; terminating child");
							self.terminator.terminate(pid);
						}
					}
				}
			}
		};

		classifier.reset();
		sink.send(OutputChunk::clear());

		let exit = match status.code() {
			Some(code) => ProcessExit::Code(code),
			None => ProcessExit::Killed,
		};
		debug!(target = "ino.supervisor", tool = %tool, ?exit, "child exited");
		Ok(exit)
	}
}

/// Reads the next chunk from an optional stream, marking it consumed on EOF
/// or error. A consumed stream pends forever so the select loop ignores it.
async fn next_chunk<R>(stream: &mut Option<R>, buf: &mut [u8]) -> Option<String>
where
	R: AsyncRead + Unpin,
{
	let Some(reader) = stream.as_mut() else {
		return std::future::pending().await;
	};

	match reader.read(buf).await {
		Ok(0) => {
			*stream = None;
			None
		}
		Ok(n) => Some(String::from_utf8_lossy(&buf[..n]).into_owned()),
		Err(e) => {
			warn!(target = "ino.supervisor", error = %e, "stream read failed; treating as closed");
			*stream = None;
			None
		}
	}
}
