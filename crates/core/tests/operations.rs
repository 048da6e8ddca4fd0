#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ino::{BoardProfile, OutputChunk, OutputSink, OutputTag, Session, UploadError};
use tempfile::TempDir;

#[derive(Default)]
struct Collector(Mutex<Vec<OutputChunk>>);

impl Collector {
	fn chunks(&self) -> Vec<OutputChunk> {
		self.0.lock().expect("collector lock should not be poisoned").clone()
	}
}

impl OutputSink for Collector {
	fn send(&self, chunk: OutputChunk) {
		self.0.lock().expect("collector lock should not be poisoned").push(chunk);
	}
}

struct Bench {
	tmp: TempDir,
	sink: Arc<Collector>,
}

impl Bench {
	fn new() -> Self {
		Self { tmp: TempDir::new().expect("temp dir should be created"), sink: Arc::default() }
	}

	fn tools_dir(&self) -> PathBuf {
		self.tmp.path().join("tools")
	}

	/// Writes a stub `arduino-cli` shell script where the session expects
	/// the real binary.
	fn stub_toolchain(&self, body: &str) {
		let dir = self.tools_dir().join("Arduino");
		std::fs::create_dir_all(&dir).expect("toolchain dir should be created");
		let cli = dir.join("arduino-cli");
		std::fs::write(&cli, format!("#!/bin/sh\n{body}\n")).expect("stub should be written");
		let mut perms = std::fs::metadata(&cli).expect("stub metadata should load").permissions();
		perms.set_mode(0o755);
		std::fs::set_permissions(&cli, perms).expect("stub should be marked executable");
	}

	fn session_with(&self, profile_json: &str) -> Session {
		let profile = BoardProfile::from_json(profile_json).expect("profile should parse");
		Session::new(
			"/dev/ttyUSB0",
			profile,
			&self.tmp.path().join("data"),
			&self.tools_dir(),
			self.sink.clone(),
		)
		.expect("session should build")
	}

	fn session(&self) -> Session {
		self.session_with(r#"{ "fqbn": "arduino:avr:uno" }"#)
	}

	fn recorded_args(&self) -> Vec<String> {
		let raw = std::fs::read_to_string(self.tmp.path().join("args.txt"))
			.expect("stub should have recorded its arguments");
		raw.lines().map(str::to_string).collect()
	}

	/// A stub that records its argument vector and exits cleanly.
	fn recording_stub(&self) {
		let record = self.tmp.path().join("args.txt");
		self.stub_toolchain(&format!("printf '%s\\n' \"$@\" > {}\nexit 0", record.display()));
	}
}

const SKETCH: &str = "void setup(){} void loop(){}";

#[tokio::test]
async fn build_success_streams_and_resolves_once() {
	let bench = Bench::new();
	bench.stub_toolchain("echo compiling; exit 0");
	let session = bench.session();

	let outcome = session.build(SKETCH).await;
	assert!(outcome.is_success(), "expected success, got {outcome:?}");

	let chunks = bench.sink.chunks();
	assert_eq!(chunks.first().map(|c| c.text.as_str()), Some("Start building...\n"));
	assert_eq!(chunks.last(), Some(&OutputChunk::clear()));
	assert!(chunks.iter().any(|c| c.text.contains("compiling")));

	let written = std::fs::read_to_string(session.paths().sketch_file.as_path())
		.expect("sketch should be on disk");
	assert_eq!(written, SKETCH);
}

#[tokio::test]
async fn building_twice_is_idempotent() {
	let bench = Bench::new();
	bench.stub_toolchain("exit 0");
	let session = bench.session();

	assert!(session.build(SKETCH).await.is_success());
	let first = std::fs::read(session.paths().sketch_file.as_path()).expect("sketch should exist");
	assert!(session.build(SKETCH).await.is_success());
	let second = std::fs::read(session.paths().sketch_file.as_path()).expect("sketch should exist");
	assert_eq!(first, second);
}

#[tokio::test]
async fn build_exit_codes_map_to_typed_reasons() {
	for (code, reason) in [
		(1, "build failed"),
		(2, "sketch not found"),
		(3, "invalid command-line option"),
		(4, "unknown preference"),
		(9, "unknown error"),
	] {
		let bench = Bench::new();
		bench.stub_toolchain(&format!("exit {code}"));
		let outcome = bench.session().build(SKETCH).await;
		let failure = outcome.failure().expect("nonzero exit should fail").to_string();
		assert_eq!(failure, reason, "exit code {code}");
	}
}

#[tokio::test]
async fn build_failure_reason_also_reaches_the_sink() {
	let bench = Bench::new();
	bench.stub_toolchain("exit 2");
	let _ = bench.session().build(SKETCH).await;

	let chunks = bench.sink.chunks();
	assert!(
		chunks.iter().any(|c| c.tag == OutputTag::Error && c.text == "sketch not found\n"),
		"failure line should be streamed: {chunks:?}"
	);
}

#[tokio::test]
async fn signal_exit_is_aborted_even_without_an_abort_call() {
	let bench = Bench::new();
	// The stub terminates itself, mimicking a kill that reports no code.
	bench.stub_toolchain("kill -TERM $$");
	let outcome = bench.session().build(SKETCH).await;
	assert!(outcome.is_aborted(), "expected aborted, got {outcome:?}");
}

#[tokio::test]
async fn abort_before_build_resolves_aborted_within_the_first_ticks() {
	let bench = Bench::new();
	bench.stub_toolchain("sleep 5");
	let session = bench.session();
	session.abort();

	let started = Instant::now();
	let outcome = session.build(SKETCH).await;
	assert!(outcome.is_aborted(), "expected aborted, got {outcome:?}");
	assert!(started.elapsed() < Duration::from_secs(2), "abort should not wait for the child");
}

#[tokio::test]
async fn workspace_write_failure_fails_before_spawning() {
	let bench = Bench::new();
	// No stub toolchain exists; reaching the spawn would fail differently.
	let session = bench.session();
	std::fs::create_dir_all(session.paths().sketch_file.as_path())
		.expect("blocking directory should be created");

	let outcome = session.build(SKETCH).await;
	assert!(matches!(outcome.failure(), Some(UploadError::WorkspaceWrite(_))), "got {outcome:?}");
	let chunks = bench.sink.chunks();
	assert!(!chunks.iter().any(|c| c.text == "Start building...\n"));
}

#[tokio::test]
async fn missing_toolchain_binary_is_a_spawn_failure() {
	let bench = Bench::new();
	let outcome = bench.session().build(SKETCH).await;
	assert!(matches!(outcome.failure(), Some(UploadError::Supervisor(_))), "got {outcome:?}");
}

#[tokio::test]
async fn compile_invocation_uses_the_compile_grammar() {
	let bench = Bench::new();
	bench.recording_stub();
	let session = bench.session();
	assert!(session.build(SKETCH).await.is_success());

	let args = bench.recorded_args();
	assert_eq!(args[0], "compile");
	assert_eq!(args[1], "--fqbn");
	assert_eq!(args[2], "arduino:avr:uno");
	assert!(args.contains(&"--warnings=none".to_string()));
	assert!(args.contains(&"--config-file".to_string()));
	assert_eq!(args.last(), Some(&session.paths().sketch_dir.display().to_string()));
}

#[tokio::test]
async fn flash_invocation_uses_the_upload_grammar() {
	let bench = Bench::new();
	bench.recording_stub();
	let session = bench.session();
	assert!(session.flash(None).await.is_success());

	let args = bench.recorded_args();
	assert_eq!(args[0], "upload");
	assert!(args.contains(&"--verify".to_string()));
	assert!(args.contains(&"-p/dev/ttyUSB0".to_string()));
	assert!(args.contains(&"--input-dir".to_string()));
}

#[tokio::test]
async fn flash_failure_without_cancel_keeps_the_flash_failed_reason() {
	let bench = Bench::new();
	bench.stub_toolchain("exit 1");
	let outcome = bench.session().flash(None).await;
	assert_eq!(
		outcome.failure().map(ToString::to_string),
		Some("flash failed".to_string()),
		"got {outcome:?}"
	);
}

#[tokio::test]
async fn aborted_flash_waits_the_release_grace_before_resolving() {
	let bench = Bench::new();
	// Ignore the terminate signal so the exit-code-1 path is exercised
	// rather than the killed path.
	bench.stub_toolchain("trap '' TERM\nsleep 1\nexit 1");
	let session = Arc::new(bench.session());

	let aborter = {
		let session = session.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(300)).await;
			session.abort();
		})
	};

	let started = Instant::now();
	let outcome = session.flash(None).await;
	aborter.await.expect("aborter task should finish");
	assert!(outcome.is_aborted(), "expected aborted, got {outcome:?}");
	// Script runtime plus the fixed 100ms release grace.
	assert!(started.elapsed() >= Duration::from_millis(1100), "grace period should elapse");
}

#[tokio::test]
async fn flash_out_of_table_codes_resolve_unknown_error() {
	let bench = Bench::new();
	bench.stub_toolchain("exit 7");
	let outcome = bench.session().flash(None).await;
	assert_eq!(
		outcome.failure().map(ToString::to_string),
		Some("unknown error".to_string()),
		"got {outcome:?}"
	);
}

#[tokio::test]
async fn successful_flash_waits_the_configured_settle_delay() {
	let bench = Bench::new();
	bench.stub_toolchain("exit 0");
	let session =
		bench.session_with(r#"{ "fqbn": "arduino:avr:uno", "postUploadDelay": 200 }"#);

	let started = Instant::now();
	let outcome = session.flash(None).await;
	assert!(outcome.is_success(), "got {outcome:?}");
	assert!(started.elapsed() >= Duration::from_millis(200), "settle delay should elapse");
}

#[tokio::test]
async fn realtime_firmware_resolves_under_the_firmware_directory() {
	let bench = Bench::new();
	bench.recording_stub();
	let session =
		bench.session_with(r#"{ "fqbn": "arduino:avr:uno", "firmware": "realtime.hex" }"#);

	assert!(session.flash_realtime_firmware().await.is_success());

	let args = bench.recorded_args();
	let flag = args.iter().position(|a| a == "--input-file").expect("input-file flag present");
	let expected = session.paths().firmware_dir.join("realtime.hex").display().to_string();
	assert_eq!(args[flag + 1], expected);
	assert_eq!(args[flag + 2], expected);
}

#[tokio::test]
async fn realtime_firmware_without_a_name_fails_typed() {
	let bench = Bench::new();
	bench.stub_toolchain("exit 0");
	let session = bench.session();

	let outcome = session.flash_realtime_firmware().await;
	assert!(matches!(outcome.failure(), Some(UploadError::FirmwareNotConfigured)), "got {outcome:?}");
}

#[tokio::test]
async fn flash_streams_end_in_the_clear_chunk() {
	let bench = Bench::new();
	bench.stub_toolchain("printf 'avrdude: Writing | ## | 100%%' >&2; exit 0");
	let session = bench.session();
	assert!(session.flash(None).await.is_success());

	let chunks = bench.sink.chunks();
	assert_eq!(chunks.last(), Some(&OutputChunk::clear()));
	assert!(chunks.iter().any(|c| c.tag == OutputTag::Progress), "progress should be tagged: {chunks:?}");
}
