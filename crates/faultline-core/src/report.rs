// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Normalized reports.

use serde::{Deserialize, Serialize};

use crate::event::{ErrorRecord, ExceptionRecord, RawEvent};

/// Which capture variant a report was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportKind {
	Exception { type_name: String },
	Error,
}

/// The canonical shape handed to a report sink.
///
/// Reports carry no cause chain; a nested cause on the captured failure is
/// dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
	pub kind: ReportKind,
	/// Always present; the receiving service rejects reports without one.
	pub severity: i64,
	pub message: String,
	pub file: String,
	pub line: u32,
	pub trace: Option<serde_json::Value>,
}

impl NormalizedReport {
	pub fn is_exception(&self) -> bool {
		matches!(self.kind, ReportKind::Exception { .. })
	}

	pub fn type_name(&self) -> Option<&str> {
		match &self.kind {
			ReportKind::Exception { type_name } => Some(type_name),
			ReportKind::Error => None,
		}
	}
}

/// Converts a captured failure into a report. Never fails: missing values
/// are defaulted.
pub fn normalize(event: RawEvent) -> NormalizedReport {
	match event {
		RawEvent::Exception(record) => from_exception(record),
		RawEvent::Error(record) => from_error(record),
	}
}

fn from_exception(record: ExceptionRecord) -> NormalizedReport {
	let message = format!("{}: {}", record.type_name, record.message);
	NormalizedReport {
		kind: ReportKind::Exception {
			type_name: record.type_name,
		},
		severity: record.code.unwrap_or(0),
		message,
		file: record.file,
		line: record.line,
		trace: record.trace,
	}
}

fn from_error(record: ErrorRecord) -> NormalizedReport {
	NormalizedReport {
		kind: ReportKind::Error,
		severity: record.severity.unwrap_or(0),
		message: record.message,
		file: record.file,
		line: record.line,
		trace: record.context,
	}
}

impl From<RawEvent> for NormalizedReport {
	fn from(event: RawEvent) -> Self {
		normalize(event)
	}
}
