// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture-time classification of plain error text.
//!
//! Some capture points only ever see a formatted message, for example a log
//! line reading `Uncaught ParseError: unexpected token`. [`ExceptionTypes`]
//! decides at that point whether the text describes a known exception type,
//! so downstream code only ever matches on [`RawEvent`] variants.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::event::{ErrorRecord, ExceptionRecord, RawEvent};

/// Name of the root exception type every registered type descends from.
pub const BASE_EXCEPTION: &str = "Exception";

static UNCAUGHT: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?s)^Uncaught ([A-Za-z0-9_\\]+(?:::[A-Za-z0-9_\\]+)*):(.*)$")
		.expect("static pattern is valid")
});

/// The set of type names treated as exceptions: the base type plus every
/// registered subtype.
#[derive(Debug, Clone)]
pub struct ExceptionTypes {
	names: HashSet<String>,
}

impl ExceptionTypes {
	pub fn new() -> Self {
		let mut names = HashSet::new();
		names.insert(BASE_EXCEPTION.to_string());
		Self { names }
	}

	/// Registers a subtype of the base exception.
	pub fn register(mut self, type_name: impl Into<String>) -> Self {
		self.names.insert(type_name.into());
		self
	}

	pub fn is_exception_type(&self, type_name: &str) -> bool {
		self.names.contains(type_name)
	}

	/// Turns an error record into an exception record when its message has
	/// the form `Uncaught <Type>: <rest>` and `<Type>` is a known exception
	/// type. Anything else stays a plain error.
	pub fn classify(&self, record: ErrorRecord) -> RawEvent {
		let Some((type_name, rest)) = self.match_uncaught(&record.message) else {
			return RawEvent::Error(record);
		};

		RawEvent::Exception(ExceptionRecord {
			type_name,
			message: rest,
			code: record.severity,
			file: record.file,
			line: record.line,
			trace: record.context,
		})
	}

	fn match_uncaught(&self, message: &str) -> Option<(String, String)> {
		let caps = UNCAUGHT.captures(message)?;
		let type_name = caps.get(1)?.as_str();
		if !self.is_exception_type(type_name) {
			return None;
		}
		let rest = caps.get(2).map_or("", |m| m.as_str()).trim_start();
		Some((type_name.to_string(), rest.to_string()))
	}
}

impl Default for ExceptionTypes {
	fn default() -> Self {
		Self::new()
	}
}
