//! Board profile configuration supplied by the host application.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::UploadError;

/// Compile/upload target description for one board.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardProfile {
	/// Fully qualified board name, fixed or keyed by host platform.
	pub fqbn: FqbnSpec,
	/// Extra library directories passed to the compiler when present on disk.
	#[serde(default)]
	pub library: Vec<PathBuf>,
	/// Prebuilt firmware file name resolved under the firmware directory.
	#[serde(default)]
	pub firmware: Option<String>,
	/// Milliseconds to wait after a successful flash while the device
	/// re-enumerates.
	#[serde(default, rename = "postUploadDelay")]
	pub post_upload_delay: Option<u64>,
}

impl BoardProfile {
	/// Parses a profile from the host application's JSON configuration.
	pub fn from_json(json: &str) -> Result<Self, UploadError> {
		Ok(serde_json::from_str(json)?)
	}
}

/// Fqbn value, resolved once at session construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FqbnSpec {
	Fixed(String),
	/// Keyed by [`std::env::consts::OS`] values (`linux`, `macos`,
	/// `windows`) for boards whose target differs per host.
	PerPlatform(HashMap<String, String>),
}

impl FqbnSpec {
	/// Resolves the fqbn for the host platform.
	pub fn resolve(&self) -> Result<&str, UploadError> {
		match self {
			Self::Fixed(fqbn) => Ok(fqbn),
			Self::PerPlatform(map) => map
				.get(std::env::consts::OS)
				.map(String::as_str)
				.ok_or_else(|| UploadError::UnsupportedPlatform(std::env::consts::OS.to_string())),
		}
	}
}
