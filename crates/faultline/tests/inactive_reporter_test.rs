// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A reporter without a credential stays silent on every capture path,
//! including the process-wide panic hook.

mod common;

use common::RecordingSink;
use faultline::{Delivery, Reporter};
use faultline_config::ReporterConfig;
use faultline_core::{severity, ErrorRecord, LogLevel};
use tracing_subscriber::prelude::*;

#[test]
fn no_capture_path_reaches_the_sink() {
	let sink = RecordingSink::new();
	let reporter = Reporter::builder(ReporterConfig::default())
		.build_constant(None)
		.sink(sink.clone())
		.build()
		.unwrap();
	assert!(!reporter.is_active());

	reporter.install_panic_hook();
	let subscriber = tracing_subscriber::registry().with(reporter.layer());
	tracing::subscriber::with_default(subscriber, || {
		tracing::error!(order_id = 7, "payment declined");
		let _ = std::panic::catch_unwind(|| panic!("worker crashed"));
	});

	let err = std::io::Error::other("permission denied");
	assert_eq!(reporter.capture_error(&err), Delivery::Inactive);
	assert_eq!(
		reporter.capture_message("disk full", LogLevel::Error),
		Delivery::Inactive
	);
	assert_eq!(
		reporter.report_fatal(ErrorRecord::new("boom").with_severity(severity::ERROR)),
		Delivery::Inactive
	);

	assert!(sink.calls().is_empty());
}
