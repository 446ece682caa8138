// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing layer that forwards log events to the reporter.
//!
//! Every event at or above the configured level becomes a report. Fields are
//! read as follows:
//!
//! - `message`: the report message
//! - `severity`: integer severity code; defaults to the level's code
//! - `exception`: exception type name; makes the report an exception
//! - anything else: collected into the trace context
//!
//! Events emitted by faultline itself or by the HTTP transport stack are
//! ignored. An event raised while another thread holds the sink is dropped.

use std::fmt;

use faultline_core::{ErrorRecord, ExceptionRecord, LogLevel, RawEvent};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::writer::in_pipeline;
use crate::Reporter;

const IGNORED_TARGETS: &[&str] = &["faultline", "reqwest", "hyper", "h2", "rustls"];

/// A tracing [`Layer`] that reports log events.
#[derive(Clone)]
pub struct ReportingLayer {
	reporter: Reporter,
}

impl ReportingLayer {
	pub fn new(reporter: Reporter) -> Self {
		Self { reporter }
	}
}

impl<S> Layer<S> for ReportingLayer
where
	S: Subscriber,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if is_ignored_target(metadata.target()) || in_pipeline() {
			return;
		}

		let level = level_from_tracing(metadata.level());
		if !self.reporter.accepts(level) {
			return;
		}

		let mut visitor = ReportVisitor::default();
		event.record(&mut visitor);

		let file = metadata.file().unwrap_or_default();
		let line = metadata.line().unwrap_or_default();
		let raw = visitor.into_event(&self.reporter, level, file, line);
		self.reporter.report_captured(raw, level);
	}
}

fn is_ignored_target(target: &str) -> bool {
	IGNORED_TARGETS.iter().any(|t| target.starts_with(t))
}

pub(crate) fn level_from_tracing(level: &Level) -> LogLevel {
	match *level {
		Level::ERROR => LogLevel::Error,
		Level::WARN => LogLevel::Warn,
		Level::INFO => LogLevel::Info,
		_ => LogLevel::Debug,
	}
}

#[derive(Default)]
struct ReportVisitor {
	message: Option<String>,
	severity: Option<i64>,
	exception: Option<String>,
	fields: Map<String, Value>,
}

impl ReportVisitor {
	fn into_event(self, reporter: &Reporter, level: LogLevel, file: &str, line: u32) -> RawEvent {
		let message = self.message.unwrap_or_default();
		let context = (!self.fields.is_empty()).then_some(Value::Object(self.fields));

		if let Some(type_name) = self.exception {
			let mut record = ExceptionRecord::new(type_name, message).at(file, line);
			record.code = self.severity;
			record.trace = context;
			return RawEvent::Exception(record);
		}

		let mut record = ErrorRecord::new(message)
			.with_severity(self.severity.unwrap_or_else(|| level.default_severity()))
			.at(file, line);
		record.context = context;
		reporter.classify(record)
	}
}

impl Visit for ReportVisitor {
	fn record_i64(&mut self, field: &Field, value: i64) {
		if field.name() == "severity" {
			self.severity = Some(value);
		} else {
			self.fields.insert(field.name().to_string(), Value::from(value));
		}
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		match (field.name(), i64::try_from(value)) {
			("severity", Ok(code)) => self.severity = Some(code),
			_ => {
				self.fields.insert(field.name().to_string(), Value::from(value));
			}
		}
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.fields.insert(field.name().to_string(), Value::from(value));
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		match field.name() {
			"message" => self.message = Some(value.to_string()),
			"exception" => self.exception = Some(value.to_string()),
			name => {
				self.fields.insert(name.to_string(), Value::from(value));
			}
		}
	}

	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let value = format!("{value:?}");
		match field.name() {
			"message" => self.message = Some(value),
			"exception" => self.exception = Some(value),
			name => {
				self.fields.insert(name.to_string(), Value::from(value));
			}
		}
	}
}
