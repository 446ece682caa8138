// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Blocking HTTP transport that posts entries to a Raygun-compatible
//! endpoint.

use std::time::Duration;

use chrono::Utc;
use faultline_config::{ApiKey, ReporterConfig};
use faultline_core::{CustomData, NormalizedReport, TagSet};
use faultline_redact::{filter_custom_data, FilterRuleSet};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::SinkError;
use crate::sink::ReportSink;
use crate::user::UserIdentity;

/// SDK version for identification.
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
/// SDK name for identification.
const SDK_NAME: &str = "faultline-rust";

const API_KEY_HEADER: &str = "X-ApiKey";

/// Class name used for plain errors, which carry no type of their own.
const ERROR_CLASS_NAME: &str = "Error";

/// [`ReportSink`] that posts JSON entries over HTTP.
pub struct HttpSink {
	api_key: ApiKey,
	endpoint: String,
	timeout: Duration,
	client: Client,
	user: Option<UserIdentity>,
	filter_rules: FilterRuleSet,
	machine_name: Option<String>,
}

impl HttpSink {
	pub fn new(config: &ReporterConfig, api_key: ApiKey) -> Result<Self, SinkError> {
		let client = build_client(config.request_timeout, None)?;
		Ok(Self {
			api_key,
			endpoint: config.endpoint.clone(),
			timeout: config.request_timeout,
			client,
			user: None,
			filter_rules: config.filter_rules.clone(),
			machine_name: machine_name(),
		})
	}

	fn post(&self, entry: &Entry<'_>) -> Result<(), SinkError> {
		let response = self
			.client
			.post(&self.endpoint)
			.header(API_KEY_HEADER, self.api_key.expose())
			.json(entry)
			.send()?;

		if response.status().is_success() {
			debug!(status = response.status().as_u16(), "crash report delivered");
			Ok(())
		} else {
			let status = response.status().as_u16();
			let message = response.text().unwrap_or_default();
			error!(status, message = %message, "reporting service rejected crash report");
			Err(SinkError::ServerError { status, message })
		}
	}

	fn entry<'a>(
		&'a self,
		error: ErrorDetails<'a>,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Entry<'a> {
		build_entry(
			error,
			tags,
			custom_data,
			&self.filter_rules,
			self.user.as_ref(),
			self.machine_name.as_deref(),
		)
	}
}

impl ReportSink for HttpSink {
	fn send_error(
		&mut self,
		severity: i64,
		message: &str,
		file: &str,
		line: u32,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Result<(), SinkError> {
		let error = ErrorDetails {
			class_name: ERROR_CLASS_NAME,
			message,
			data: Some(serde_json::json!({ "severity": severity })),
			stack_trace: vec![StackFrame::origin(file, line)],
		};
		self.post(&self.entry(error, tags, custom_data))
	}

	fn send_exception(
		&mut self,
		report: &NormalizedReport,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Result<(), SinkError> {
		let mut stack_trace = vec![StackFrame::origin(&report.file, report.line)];
		stack_trace.extend(report.trace.as_ref().map(frames_from_trace).unwrap_or_default());

		let error = ErrorDetails {
			class_name: report.type_name().unwrap_or(ERROR_CLASS_NAME),
			message: &report.message,
			data: (report.severity != 0).then(|| serde_json::json!({ "code": report.severity })),
			stack_trace,
		};
		self.post(&self.entry(error, tags, custom_data))
	}

	fn set_user(&mut self, user: Option<&UserIdentity>) {
		self.user = user.cloned();
	}

	fn set_proxy(&mut self, host_port: &str) -> Result<(), SinkError> {
		self.client = build_client(self.timeout, Some(host_port))?;
		debug!(proxy = %host_port, "crash reporting proxy configured");
		Ok(())
	}

	fn set_filter_params(&mut self, rules: &FilterRuleSet) {
		self.filter_rules = rules.clone();
	}
}

fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<Client, SinkError> {
	let mut builder = Client::builder()
		.timeout(timeout)
		.user_agent(format!("{SDK_NAME}/{SDK_VERSION}"));

	if let Some(host_port) = proxy {
		let url = if host_port.contains("://") {
			host_port.to_string()
		} else {
			format!("http://{host_port}")
		};
		let proxy = reqwest::Proxy::all(&url).map_err(|e| SinkError::InvalidProxy {
			proxy: host_port.to_string(),
			message: e.to_string(),
		})?;
		builder = builder.proxy(proxy);
	}

	Ok(builder.build()?)
}

fn machine_name() -> Option<String> {
	std::env::var("HOSTNAME")
		.or_else(|_| std::env::var("COMPUTERNAME"))
		.ok()
		.filter(|h| !h.is_empty())
}

fn frames_from_trace(trace: &Value) -> Vec<StackFrame<'_>> {
	let Some(frames) = trace.as_array() else {
		return Vec::new();
	};
	frames
		.iter()
		.filter_map(|frame| {
			let frame = frame.as_object()?;
			Some(StackFrame {
				line_number: frame
					.get("line")
					.and_then(Value::as_u64)
					.and_then(|l| u32::try_from(l).ok())
					.unwrap_or(0),
				file_name: frame.get("file").and_then(Value::as_str).unwrap_or(""),
				method_name: frame.get("function").and_then(Value::as_str),
			})
		})
		.collect()
}

/// Builds the wire entry. Custom data is filtered with `rules` here as well,
/// so the transport never sends a sensitive value it was handed.
fn build_entry<'a>(
	error: ErrorDetails<'a>,
	tags: Option<&TagSet>,
	custom_data: Option<&CustomData>,
	rules: &FilterRuleSet,
	user: Option<&'a UserIdentity>,
	machine_name: Option<&'a str>,
) -> Entry<'a> {
	Entry {
		occurred_on: Utc::now().to_rfc3339(),
		details: Details {
			machine_name,
			error,
			tags: tags
				.map(|t| t.iter().map(str::to_string).collect())
				.unwrap_or_default(),
			user_custom_data: custom_data
				.map(|c| filter_custom_data(c, rules))
				.unwrap_or_default(),
			user: user.map(|u| UserDetails {
				identifier: &u.email,
			}),
			client: ClientDetails {
				name: SDK_NAME,
				version: SDK_VERSION,
			},
		},
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Entry<'a> {
	occurred_on: String,
	details: Details<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Details<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	machine_name: Option<&'a str>,
	error: ErrorDetails<'a>,
	tags: Vec<String>,
	user_custom_data: CustomData,
	#[serde(skip_serializing_if = "Option::is_none")]
	user: Option<UserDetails<'a>>,
	client: ClientDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetails<'a> {
	class_name: &'a str,
	message: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<Value>,
	stack_trace: Vec<StackFrame<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StackFrame<'a> {
	line_number: u32,
	file_name: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	method_name: Option<&'a str>,
}

impl<'a> StackFrame<'a> {
	fn origin(file: &'a str, line: u32) -> Self {
		Self {
			line_number: line,
			file_name: file,
			method_name: None,
		}
	}
}

#[derive(Debug, Serialize)]
struct UserDetails<'a> {
	identifier: &'a str,
}

#[derive(Debug, Serialize)]
struct ClientDetails {
	name: &'static str,
	version: &'static str,
}
