//! Session-scoped filesystem layout derived from the board target.

use std::path::{Path, PathBuf};

#[cfg(windows)]
const CLI_BINARY: &str = "arduino-cli.exe";
#[cfg(not(windows))]
const CLI_BINARY: &str = "arduino-cli";

const SKETCH_FILE_NAME: &str = "code.ino";

/// Paths owned by one session: its workspace, caches, and the toolchain
/// locations it invokes. All of them are derived once at construction and
/// scoped to the session's target, never global.
#[derive(Debug, Clone)]
pub struct SessionPaths {
	/// Toolchain install directory under the tools root.
	pub arduino_dir: PathBuf,
	/// The `arduino-cli` binary.
	pub cli: PathBuf,
	/// Toolchain config file; produced by the bootstrap collaborator and
	/// treated as a precondition here.
	pub config_file: PathBuf,
	/// Sketch workspace directory the source file is written into.
	pub sketch_dir: PathBuf,
	/// The sketch source file inside the workspace.
	pub sketch_file: PathBuf,
	/// Compiler output directory.
	pub build_dir: PathBuf,
	/// Compiler cache directory.
	pub build_cache_dir: PathBuf,
	/// Libraries bundled with the toolchain install.
	pub builtin_library_dir: PathBuf,
	/// Directory prebuilt firmware files are resolved under.
	pub firmware_dir: PathBuf,
}

impl SessionPaths {
	pub fn new(user_data_dir: &Path, tools_dir: &Path, fqbn: &str) -> Self {
		let arduino_dir = tools_dir.join("Arduino");
		let data_dir = user_data_dir.join("arduino");
		let project_dir = data_dir.join(project_dir_name(fqbn));
		let sketch_dir = project_dir.join("code");

		Self {
			cli: arduino_dir.join(CLI_BINARY),
			config_file: data_dir.join("arduino-cli.yaml"),
			sketch_file: sketch_dir.join(SKETCH_FILE_NAME),
			build_dir: project_dir.join("build"),
			build_cache_dir: project_dir.join("buildCache"),
			builtin_library_dir: arduino_dir.join("libraries"),
			firmware_dir: tools_dir.join("..").join("firmwares").join("arduino"),
			arduino_dir,
			sketch_dir,
		}
	}
}

/// Project directory name for a target: the fqbn with `:` replaced by `_`,
/// suffixed `_project`, truncated to its first three `_`-separated segments.
fn project_dir_name(fqbn: &str) -> String {
	let slug = format!("{}_project", fqbn.replace(':', "_"));
	slug.split('_').take(3).collect::<Vec<_>>().join("_")
}
