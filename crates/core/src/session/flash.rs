//! Upload a built or prebuilt firmware image to the peripheral.

use std::path::Path;
use std::time::Duration;

use ino_runtime::ProcessExit;
use tokio::time::sleep;
use tracing::debug;

use super::Session;
use crate::classifier::ToolchainClassifier;
use crate::error::UploadError;
use crate::outcome::Outcome;

/// Grace period between an aborted flash exit and resolving, so the OS can
/// release the serial handle before the caller reopens it.
const ABORT_RELEASE_GRACE: Duration = Duration::from_millis(100);

/// Boards that must be flashed through the kflash programmer.
const KFLASH_FQBN_PREFIX: &str = "Maixduino:k210:";

impl Session {
	/// Flashes the artifact built by [`Session::build`], or `firmware` when
	/// supplied.
	pub async fn flash(&self, firmware: Option<&Path>) -> Outcome {
		let args = self.upload_args(firmware);

		let mut classifier = ToolchainClassifier::default();
		let exit = match self
			.supervisor()
			.run(&self.paths.cli, &args, &mut classifier, self.sink.as_ref())
			.await
		{
			Ok(exit) => exit,
			Err(e) => return self.fail(e.into()),
		};

		match exit {
			ProcessExit::Killed => Outcome::Aborted,
			ProcessExit::Code(0) => {
				if let Some(ms) = self.profile.post_upload_delay {
					debug!(target = "ino.flash", delay_ms = ms, "waiting for device re-enumeration");
					sleep(Duration::from_millis(ms)).await;
				}
				Outcome::Success
			}
			ProcessExit::Code(1) if self.is_aborted() => {
				sleep(ABORT_RELEASE_GRACE).await;
				Outcome::Aborted
			}
			ProcessExit::Code(1) => self.fail(UploadError::FlashFailed),
			ProcessExit::Code(_) => self.fail(UploadError::UnknownExit),
		}
	}

	/// Flashes the profile's named firmware file from the firmware
	/// directory.
	pub async fn flash_realtime_firmware(&self) -> Outcome {
		let Some(name) = self.profile.firmware.as_deref() else {
			return self.fail(UploadError::FirmwareNotConfigured);
		};
		let path = self.paths.firmware_dir.join(name);
		self.flash(Some(&path)).await
	}

	fn upload_args(&self, firmware: Option<&Path>) -> Vec<String> {
		let mut args = vec![
			"upload".to_string(),
			"--fqbn".to_string(),
			self.fqbn.clone(),
			"--verbose".to_string(),
			"--verify".to_string(),
			"--config-file".to_string(),
			self.paths.config_file.display().to_string(),
			format!("-p{}", self.peripheral_path),
		];

		if self.fqbn.starts_with(KFLASH_FQBN_PREFIX) {
			args.push("-Pkflash".to_string());
		}

		match firmware {
			Some(path) => {
				// The uploader expects the image both as the input-file
				// option value and as the positional sketch argument.
				args.push("--input-file".to_string());
				args.push(path.display().to_string());
				args.push(path.display().to_string());
			}
			None => {
				args.push("--input-dir".to_string());
				args.push(self.paths.build_dir.display().to_string());
				args.push(self.paths.sketch_dir.display().to_string());
			}
		}

		args
	}
}
