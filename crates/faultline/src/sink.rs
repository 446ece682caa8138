// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The boundary to the remote reporting service.

use faultline_core::{CustomData, NormalizedReport, TagSet};
use faultline_redact::FilterRuleSet;

use crate::error::SinkError;
use crate::user::UserIdentity;

/// Transport that delivers reports to the reporting service.
///
/// The writer calls [`set_filter_params`](ReportSink::set_filter_params) and
/// [`set_proxy`](ReportSink::set_proxy) once at construction, then
/// [`set_user`](ReportSink::set_user) before every send. Implementations may
/// block.
pub trait ReportSink: Send {
	fn send_error(
		&mut self,
		severity: i64,
		message: &str,
		file: &str,
		line: u32,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Result<(), SinkError>;

	fn send_exception(
		&mut self,
		report: &NormalizedReport,
		tags: Option<&TagSet>,
		custom_data: Option<&CustomData>,
	) -> Result<(), SinkError>;

	/// Identity for the next send. `None` clears any previous identity.
	fn set_user(&mut self, user: Option<&UserIdentity>);

	/// `host_port` is `host` or `host:port`.
	fn set_proxy(&mut self, host_port: &str) -> Result<(), SinkError>;

	fn set_filter_params(&mut self, rules: &FilterRuleSet);
}
