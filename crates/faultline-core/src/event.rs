// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Failures as they are captured, before normalization.

use serde::{Deserialize, Serialize};

/// A failure exactly as it was captured.
///
/// The variant is chosen where the failure is captured and is never inferred
/// later in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawEvent {
	Exception(ExceptionRecord),
	Error(ErrorRecord),
}

impl RawEvent {
	pub fn is_exception(&self) -> bool {
		matches!(self, Self::Exception(_))
	}
}

impl From<ExceptionRecord> for RawEvent {
	fn from(record: ExceptionRecord) -> Self {
		Self::Exception(record)
	}
}

impl From<ErrorRecord> for RawEvent {
	fn from(record: ErrorRecord) -> Self {
		Self::Error(record)
	}
}

/// An exception-like failure: a typed error with a code and a trace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExceptionRecord {
	pub type_name: String,
	pub message: String,
	pub code: Option<i64>,
	pub file: String,
	pub line: u32,
	pub trace: Option<serde_json::Value>,
}

impl ExceptionRecord {
	pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			message: message.into(),
			..Default::default()
		}
	}

	pub fn with_code(mut self, code: i64) -> Self {
		self.code = Some(code);
		self
	}

	pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
		self.file = file.into();
		self.line = line;
		self
	}

	pub fn with_trace(mut self, trace: serde_json::Value) -> Self {
		self.trace = Some(trace);
		self
	}
}

/// A plain error: a numeric severity, a message and free-form context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorRecord {
	/// Unset when the capture point had no severity to give.
	pub severity: Option<i64>,
	pub message: String,
	pub file: String,
	pub line: u32,
	pub context: Option<serde_json::Value>,
}

impl ErrorRecord {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			..Default::default()
		}
	}

	pub fn with_severity(mut self, severity: i64) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
		self.file = file.into();
		self.line = line;
		self
	}

	pub fn with_context(mut self, context: serde_json::Value) -> Self {
		self.context = Some(context);
		self
	}
}
