//! Child-process lifecycle shared by the build and flash operations.
//!
//! This crate owns the pieces that do not know anything about a particular
//! toolchain: spawning a child, relaying its stdout/stderr through a
//! caller-supplied classifier to a sink, polling a shared cancellation flag,
//! and terminating the child with the strategy the host platform requires.
//! The semantic layer (argument grammars, exit-code tables, output patterns)
//! lives in `ino-rs` on top of these primitives.

pub mod cancel;
pub mod stream;
pub mod supervisor;
pub mod terminate;

pub use cancel::CancelFlag;
pub use stream::{
	Classifier, OutputChunk, OutputSink, OutputTag, PlainClassifier, SinkFn, StreamOrigin,
};
pub use supervisor::{CANCEL_POLL_INTERVAL, ProcessExit, Supervisor, SupervisorError};
pub use terminate::{Terminator, host_terminator};
