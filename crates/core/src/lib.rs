//! Build and flash sessions driving the `arduino-cli` toolchain.
//!
//! The crate is embedded as a library by a host application: the host
//! constructs a [`Session`] for one (peripheral, board profile) pairing,
//! receives classified output chunks through its [`OutputSink`], and gets a
//! typed [`Outcome`] back from every build or flash call. Cancellation is
//! cooperative through [`Session::abort`].
//!
//! The toolchain binary itself, its configuration bootstrap, and the
//! rendering of tagged output are external collaborators; this crate only
//! orchestrates the child process and reclassifies its output stream.

pub mod board;
pub mod classifier;
pub mod error;
pub mod outcome;
pub mod paths;
pub mod session;

pub use board::{BoardProfile, FqbnSpec};
pub use classifier::ToolchainClassifier;
pub use error::UploadError;
pub use ino_runtime::{CancelFlag, OutputChunk, OutputSink, OutputTag, SinkFn, StreamOrigin};
pub use outcome::Outcome;
pub use paths::SessionPaths;
pub use session::Session;
