// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::Arc;

use faultline::{ReportSink, SinkError, UserIdentity};
use faultline_core::{CustomData, NormalizedReport, TagSet};
use faultline_redact::FilterRuleSet;
use parking_lot::Mutex;

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
	Error {
		severity: i64,
		message: String,
		file: String,
		line: u32,
		tags: Option<Vec<String>>,
		custom_data: Option<CustomData>,
	},
	Exception {
		type_name: String,
		message: String,
		tags: Option<Vec<String>>,
		custom_data: Option<CustomData>,
	},
	SetUser(Option<String>),
	SetProxy(String),
	SetFilterParams(usize),
}

impl SinkCall {
	pub fn is_send(&self) -> bool {
		matches!(self, SinkCall::Error { .. } | SinkCall::Exception { .. })
	}

	pub fn tags(&self) -> Option<&[String]> {
		match self {
			SinkCall::Error { tags, .. } | SinkCall::Exception { tags, .. } => tags.as_deref(),
			_ => None,
		}
	}

	pub fn custom_data(&self) -> Option<&CustomData> {
		match self {
			SinkCall::Error { custom_data, .. } | SinkCall::Exception { custom_data, .. } => {
				custom_data.as_ref()
			}
			_ => None,
		}
	}
}

/// Sink that records every call it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
	calls: Arc<Mutex<Vec<SinkCall>>>,
	fail_sends: bool,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self {
			fail_sends: true,
			..Self::default()
		}
	}

	pub fn calls(&self) -> Vec<SinkCall> {
		self.calls.lock().clone()
	}

	pub fn sends(&self) -> Vec<SinkCall> {
		self.calls().into_iter().filter(SinkCall::is_send).collect()
	}

	fn record(&self, call: SinkCall) -> Result<(), SinkError> {
		let is_send = call.is_send();
		self.calls.lock().push(call);
		if is_send && self.fail_sends {
			return Err(SinkError::ServerError {
				status: 503,
				message: "unavailable".to_string(),
			});
		}
		Ok(())
	}
}

impl ReportSink for RecordingSink {
	fn send_error(
		&mut self,
		severity: i64,
		message: &str,
		file: &str,
		line: u32,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Result<(), SinkError> {
		self.record(SinkCall::Error {
			severity,
			message: message.to_string(),
			file: file.to_string(),
			line,
			tags: tags.map(|t| t.clone().into_vec()),
			custom_data: custom_data.cloned(),
		})
	}

	fn send_exception(
		&mut self,
		report: &NormalizedReport,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Result<(), SinkError> {
		self.record(SinkCall::Exception {
			type_name: report.type_name().unwrap_or_default().to_string(),
			message: report.message.clone(),
			tags: tags.map(|t| t.clone().into_vec()),
			custom_data: custom_data.cloned(),
		})
	}

	fn set_user(&mut self, user: Option<&UserIdentity>) {
		let email = user.map(|u| u.email.clone());
		self.calls.lock().push(SinkCall::SetUser(email));
	}

	fn set_proxy(&mut self, host_port: &str) -> Result<(), SinkError> {
		self.calls.lock().push(SinkCall::SetProxy(host_port.to_string()));
		Ok(())
	}

	fn set_filter_params(&mut self, rules: &FilterRuleSet) {
		self.calls.lock().push(SinkCall::SetFilterParams(rules.len()));
	}
}
