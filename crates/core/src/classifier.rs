//! Pattern classification of toolchain output into tagged spans.

use std::sync::LazyLock;

use ino_runtime::{Classifier, OutputChunk, OutputTag, StreamOrigin};
use regex_lite::Regex;

static PROGRESS_START: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"Reading \||Writing \|").expect("progress pattern should compile"));
static PROGRESS_END: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("%").expect("progress end pattern should compile"));
static TOOL_DONE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("avrdude done").expect("completion pattern should compile"));
static DEVICE_ERROR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new("can't open device|programmer is not responding")
		.expect("device error pattern should compile")
});
static STDERR_IGNORE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("Executable segment sizes").expect("ignore pattern should compile"));
static MEMORY_SUMMARY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("Sketch uses|Global variables").expect("summary pattern should compile"));

/// Span state carried between chunks. The flasher interleaves its progress
/// output across many small chunks, so an open span must survive until its
/// closing pattern (or the stream-end clear) arrives in a later chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SpanState {
	#[default]
	Plain,
	ProgressOpen,
	ErrorOpen,
}

impl SpanState {
	fn tag(self) -> OutputTag {
		match self {
			Self::Plain => OutputTag::Plain,
			Self::ProgressOpen => OutputTag::Progress,
			Self::ErrorOpen => OutputTag::Error,
		}
	}
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
	ProgressStart,
	ProgressEnd,
	Done,
	DeviceError,
}

/// Classifier for `arduino-cli`/`avrdude` output.
///
/// Purely pattern-driven over each chunk; patterns split across a chunk
/// boundary are not recognized (no cross-chunk buffering). Classification
/// never fails: unmatched text carries the current state's tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolchainClassifier {
	state: SpanState,
}

impl ToolchainClassifier {
	fn emit(&self, spans: &mut Vec<OutputChunk>, text: &str) {
		if !text.is_empty() {
			spans.push(OutputChunk::new(text, self.state.tag()));
		}
	}
}

impl Classifier for ToolchainClassifier {
	fn classify(&mut self, origin: StreamOrigin, text: &str) -> Vec<OutputChunk> {
		if text.is_empty() {
			return Vec::new();
		}

		// Benign stderr noise is tagged distinctly but always forwarded;
		// hiding a real error would cost more than the noise.
		if origin == StreamOrigin::Stderr && STDERR_IGNORE.is_match(text) {
			return vec![OutputChunk::new(text, OutputTag::ErrorIgnored)];
		}

		if origin == StreamOrigin::Stdout && MEMORY_SUMMARY.is_match(text) {
			return vec![OutputChunk::new(text, OutputTag::Info)];
		}

		let mut events: Vec<(usize, usize, Boundary)> = Vec::new();
		for m in PROGRESS_START.find_iter(text) {
			events.push((m.start(), m.end(), Boundary::ProgressStart));
		}
		for m in PROGRESS_END.find_iter(text) {
			events.push((m.start(), m.end(), Boundary::ProgressEnd));
		}
		for m in TOOL_DONE.find_iter(text) {
			events.push((m.start(), m.end(), Boundary::Done));
		}
		for m in DEVICE_ERROR.find_iter(text) {
			events.push((m.start(), m.end(), Boundary::DeviceError));
		}
		events.sort_by_key(|&(start, _, _)| start);

		let mut spans = Vec::new();
		let mut cursor = 0usize;
		for (start, end, kind) in events {
			if start < cursor {
				continue;
			}
			match kind {
				Boundary::ProgressStart => {
					self.emit(&mut spans, &text[cursor..start]);
					self.state = SpanState::ProgressOpen;
					cursor = start;
				}
				Boundary::ProgressEnd => {
					// A stray `%` with no open progress span stays untagged.
					if self.state == SpanState::ProgressOpen {
						self.emit(&mut spans, &text[cursor..end]);
						self.state = SpanState::Plain;
						cursor = end;
					}
				}
				Boundary::Done => {
					self.emit(&mut spans, &text[cursor..start]);
					self.state = SpanState::Plain;
					cursor = start;
				}
				Boundary::DeviceError => {
					self.emit(&mut spans, &text[cursor..start]);
					self.state = SpanState::ErrorOpen;
					cursor = start;
				}
			}
		}
		self.emit(&mut spans, &text[cursor..]);
		spans
	}

	fn reset(&mut self) {
		self.state = SpanState::Plain;
	}
}
