//! Classified output chunks relayed from child-process streams.

/// Which child stream a raw chunk arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrigin {
	Stdout,
	Stderr,
}

/// Semantic category attached to a forwarded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTag {
	/// Untagged text.
	Plain,
	/// Read/write progress output from the flasher.
	Progress,
	/// Informational summary lines from the compiler.
	Info,
	/// Device or tool error output.
	Error,
	/// Matched an error-looking pattern that is known benign noise.
	/// Forwarded anyway; hiding a real error costs more than the noise.
	ErrorIgnored,
}

/// Immutable (text, tag) pair emitted to the caller's sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
	pub text: String,
	pub tag: OutputTag,
}

impl OutputChunk {
	pub fn new(text: impl Into<String>, tag: OutputTag) -> Self {
		Self { text: text.into(), tag }
	}

	pub fn plain(text: impl Into<String>) -> Self {
		Self::new(text, OutputTag::Plain)
	}

	/// Trailing chunk appended once after the child exits so no tagged span
	/// is left open on the sink.
	pub fn clear() -> Self {
		Self::plain("\r\n")
	}
}

/// Receives classified chunks in arrival order.
///
/// There is no acknowledgement or backpressure channel; implementations must
/// not block indefinitely.
pub trait OutputSink: Send + Sync {
	fn send(&self, chunk: OutputChunk);
}

/// Adapts a plain callback into an [`OutputSink`].
pub struct SinkFn<F>(F);

impl<F> SinkFn<F>
where
	F: Fn(OutputChunk) + Send + Sync,
{
	pub fn new(callback: F) -> Self {
		Self(callback)
	}
}

impl<F> OutputSink for SinkFn<F>
where
	F: Fn(OutputChunk) + Send + Sync,
{
	fn send(&self, chunk: OutputChunk) {
		(self.0)(chunk)
	}
}

/// Splits raw child output into tagged spans covering the chunk in order,
/// with no gaps or overlaps.
///
/// Implementations may carry span state between chunks; the supervisor calls
/// [`Classifier::reset`] once the child has exited, before the final clear
/// chunk goes out.
pub trait Classifier: Send {
	fn classify(&mut self, origin: StreamOrigin, text: &str) -> Vec<OutputChunk>;
	fn reset(&mut self);
}

/// Pass-through classifier tagging every chunk as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainClassifier;

impl Classifier for PlainClassifier {
	fn classify(&mut self, _origin: StreamOrigin, text: &str) -> Vec<OutputChunk> {
		vec![OutputChunk::plain(text)]
	}

	fn reset(&mut self) {}
}
