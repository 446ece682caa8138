// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for fatal error reporting.

use std::panic::PanicHookInfo;

use faultline_core::{severity, ErrorRecord};

use crate::backtrace::capture_trace;
use crate::enrich::panic_message;
use crate::writer::in_pipeline;
use crate::Reporter;

/// Install a panic hook that reports panics as fatal errors.
///
/// Wraps the existing hook and calls it after reporting. Panics raised
/// inside the reporting pipeline itself are not reported.
pub fn install_panic_hook(reporter: Reporter) {
	let previous = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		if reporter.is_active() && !in_pipeline() {
			reporter.report_panic(record_from_panic(info));
		}
		previous(info);
	}));
}

/// Builds the fatal error record for a panic.
pub(crate) fn record_from_panic(info: &PanicHookInfo<'_>) -> ErrorRecord {
	let message = panic_message(info.payload());
	let thread = std::thread::current();

	let mut record = ErrorRecord::new(message).with_severity(severity::ERROR);
	if let Some(location) = info.location() {
		record = record.at(location.file(), location.line());
	}

	let mut context = serde_json::Map::new();
	context.insert(
		"thread".to_string(),
		serde_json::Value::from(thread.name().unwrap_or("<unnamed>")),
	);
	if let Some(trace) = capture_trace() {
		context.insert("backtrace".to_string(), trace);
	}
	record.with_context(serde_json::Value::Object(context))
}
