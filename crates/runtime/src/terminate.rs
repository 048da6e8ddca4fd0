//! Platform-specific child termination strategies.

use std::process::Command;

use tracing::debug;

/// Terminates a live child process by PID.
///
/// The strategy is selected once per host via [`host_terminator`]; the
/// supervisor poll loop stays platform-agnostic.
pub trait Terminator: Send + Sync {
	fn terminate(&self, pid: u32);
}

/// Sends a standard terminate signal. Default on unix-like hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalTerminator;

impl Terminator for SignalTerminator {
	fn terminate(&self, pid: u32) {
		debug!(target = "ino.terminate", pid, "sending SIGTERM");
		match Command::new("kill").args(["-TERM", &pid.to_string()]).status() {
			Ok(status) if status.success() => {}
			Ok(status) => debug!(target = "ino.terminate", pid, %status, "kill -TERM returned non-zero"),
			Err(e) => debug!(target = "ino.terminate", pid, error = %e, "failed to run kill"),
		}
	}
}

/// Force-kills the whole process tree. Windows console children have no
/// graceful terminate signal, so the forced tree kill is the only option.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeKillTerminator;

impl Terminator for TreeKillTerminator {
	fn terminate(&self, pid: u32) {
		debug!(target = "ino.terminate", pid, "running taskkill /f /t");
		match Command::new("taskkill").args(["/PID", &pid.to_string(), "/F", "/T"]).status() {
			Ok(status) if status.success() => {}
			Ok(status) => debug!(target = "ino.terminate", pid, %status, "taskkill returned non-zero"),
			Err(e) => debug!(target = "ino.terminate", pid, error = %e, "failed to run taskkill"),
		}
	}
}

/// Returns the termination strategy for the host platform.
pub fn host_terminator() -> Box<dyn Terminator> {
	#[cfg(windows)]
	{
		Box::new(TreeKillTerminator)
	}

	#[cfg(not(windows))]
	{
		Box::new(SignalTerminator)
	}
}
