// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backtrace capture and parsing into report traces.

use std::backtrace::{Backtrace, BacktraceStatus};

use serde::Serialize;

const MAX_FRAMES: usize = 64;

/// One frame of a captured backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceFrame {
	pub function: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub line: Option<u32>,
	pub in_app: bool,
}

/// Captures the current backtrace as a JSON frame array.
///
/// Respects `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`; returns `None` when
/// capture is disabled or unsupported.
pub fn capture_trace() -> Option<serde_json::Value> {
	let backtrace = Backtrace::capture();
	if backtrace.status() != BacktraceStatus::Captured {
		return None;
	}
	let frames = parse_backtrace_string(&format!("{backtrace}"));
	serde_json::to_value(frames).ok()
}

/// Parses `std::backtrace::Backtrace` display output.
///
/// ```text
///    0: my_app::handlers::process
///              at ./src/handlers.rs:42:9
/// ```
pub fn parse_backtrace_string(bt: &str) -> Vec<TraceFrame> {
	let mut frames: Vec<TraceFrame> = Vec::new();

	for line in bt.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		if let Some(location) = line.strip_prefix("at ") {
			if let Some(frame) = frames.last_mut() {
				let (file, lineno) = parse_location(location);
				frame.file = Some(file);
				frame.line = lineno;
			}
			continue;
		}

		if frames.len() >= MAX_FRAMES {
			break;
		}

		if let Some((number, function)) = line.split_once(": ") {
			if number.trim().parse::<u32>().is_ok() {
				let function = function.trim().to_string();
				let in_app = is_in_app_frame(&function);
				frames.push(TraceFrame {
					function,
					file: None,
					line: None,
					in_app,
				});
			}
		}
	}

	frames
}

/// Splits `path:line:col` into path and line.
fn parse_location(location: &str) -> (String, Option<u32>) {
	let mut parts = location.rsplitn(3, ':');
	let last = parts.next();
	let middle = parts.next();
	let rest = parts.next();

	match (rest, middle, last) {
		(Some(path), Some(line), Some(_col)) if line.parse::<u32>().is_ok() => {
			(path.to_string(), line.parse().ok())
		}
		_ => (location.to_string(), None),
	}
}

/// Determine if a frame is from application code vs the runtime.
fn is_in_app_frame(function: &str) -> bool {
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tracing::",
		"<tracing::",
		"tracing_core::",
		"tracing_subscriber::",
		"<tracing_subscriber::",
		"faultline::",
		"<faultline::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
	];

	const SYSTEM_CONTAINS: &[&str] = &["::panic::", "::panicking::", "::rt::", "::sys_common::"];

	!SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p))
		&& !SYSTEM_CONTAINS.iter().any(|c| function.contains(c))
}
