//! Compile the session's sketch with the toolchain.

use std::fs;
use std::io;

use ino_runtime::{OutputChunk, ProcessExit};
use tracing::debug;

use super::Session;
use crate::classifier::ToolchainClassifier;
use crate::error::UploadError;
use crate::outcome::Outcome;

impl Session {
	/// Writes `source` into the sketch workspace and compiles it.
	pub async fn build(&self, source: &str) -> Outcome {
		if let Err(e) = self.prepare_sketch(source) {
			return self.fail(UploadError::WorkspaceWrite(e));
		}

		let args = self.compile_args();
		self.send(OutputChunk::plain("Start building...\n"));

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
			ProcessExit::Code(0) => Outcome::Success,
			ProcessExit::Code(1) => self.fail(UploadError::BuildFailed),
			ProcessExit::Code(2) => self.fail(UploadError::SketchNotFound),
			ProcessExit::Code(3) => self.fail(UploadError::InvalidCliOption),
			ProcessExit::Code(4) => self.fail(UploadError::UnknownPreference),
			ProcessExit::Code(_) => self.fail(UploadError::UnknownExit),
		}
	}

	/// Creates the sketch workspace if needed and writes the source file.
	/// Rewriting the same source is not an error.
	fn prepare_sketch(&self, source: &str) -> io::Result<()> {
		fs::create_dir_all(&self.paths.sketch_dir)?;
		fs::write(&self.paths.sketch_file, source)
	}

	fn compile_args(&self) -> Vec<String> {
		let mut args = vec!["compile".to_string(), "--fqbn".to_string(), self.fqbn.clone()];

		for lib in &self.profile.library {
			if lib.exists() {
				args.push("--libraries".to_string());
				args.push(lib.display().to_string());
			} else {
				debug!(target = "ino.build", library = %lib.display(), "skipping missing library path");
			}
		}

		args.push("--libraries".to_string());
		args.push(self.paths.builtin_library_dir.display().to_string());
		args.push("--warnings=none".to_string());
		args.push("--verbose".to_string());
		args.push("--build-path".to_string());
		args.push(self.paths.build_dir.display().to_string());
		args.push("--build-cache-path".to_string());
		args.push(self.paths.build_cache_dir.display().to_string());
		args.push("--config-file".to_string());
		args.push(self.paths.config_file.display().to_string());
		args.push(self.paths.sketch_dir.display().to_string());
		args
	}
}
