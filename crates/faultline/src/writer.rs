// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The report pipeline: threshold gate, user tracking, normalization,
//! enrichment, filtering and delivery.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use faultline_config::ReporterConfig;
use faultline_core::{normalize, severity, ErrorRecord, LogLevel, RawEvent, TagSet};
use faultline_redact::filter_custom_data_in_place;
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::enrich::{run_processors, Processors};
use crate::sink::ReportSink;
use crate::user::{UserIdentity, UserProvider};

/// What happened to a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	/// Handed to the sink successfully.
	Sent,
	/// No API key resolved; the reporter is inert.
	Inactive,
	/// Reporting is switched off in configuration.
	Disabled,
	/// Less severe than the configured threshold.
	BelowThreshold,
	/// Offered to the fatal path but not a fatal severity.
	NotFatal,
	/// Raised while this thread was already inside the pipeline, or captured
	/// by the tracing layer or panic hook while another thread held the sink.
	Reentrant,
	/// The sink or the pipeline failed; the failure was logged.
	Failed,
}

/// How a dispatch may wait for a sink held by another thread.
///
/// Events from the tracing layer and the panic hook can originate on a
/// thread the sending thread is waiting on, so they never block without
/// bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SinkAccess {
	Block,
	Try,
	WaitFor(Duration),
}

thread_local! {
	static IN_PIPELINE: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is running the pipeline.
pub(crate) fn in_pipeline() -> bool {
	IN_PIPELINE.with(Cell::get)
}

struct PipelineGuard;

impl PipelineGuard {
	fn enter() -> Option<Self> {
		IN_PIPELINE.with(|flag| {
			if flag.get() {
				None
			} else {
				flag.set(true);
				Some(PipelineGuard)
			}
		})
	}
}

impl Drop for PipelineGuard {
	fn drop(&mut self) {
		IN_PIPELINE.with(|flag| flag.set(false));
	}
}

/// Turns captured events into sink calls.
pub struct ReportWriter {
	config: ReporterConfig,
	sink: Mutex<Box<dyn ReportSink>>,
	processors: Processors,
	user_provider: Option<Arc<dyn UserProvider>>,
}

impl ReportWriter {
	/// Pushes the filter rules and proxy, if any, into the sink.
	pub fn new(
		config: ReporterConfig,
		mut sink: Box<dyn ReportSink>,
		processors: Processors,
		user_provider: Option<Arc<dyn UserProvider>>,
	) -> Self {
		sink.set_filter_params(&config.filter_rules);

		if let Some(proxy) = &config.proxy {
			let host_port = proxy.host_port();
			if let Err(e) = sink.set_proxy(&host_port) {
				warn!(proxy = %host_port, error = %e, "failed to configure crash reporting proxy");
			}
		}

		Self {
			config,
			sink: Mutex::new(sink),
			processors,
			user_provider,
		}
	}

	pub fn config(&self) -> &ReporterConfig {
		&self.config
	}

	/// Writes one event logged at `level`.
	pub fn write(&self, event: RawEvent, level: LogLevel) -> Delivery {
		self.write_with(event, level, SinkAccess::Block)
	}

	pub(crate) fn write_with(
		&self,
		event: RawEvent,
		level: LogLevel,
		access: SinkAccess,
	) -> Delivery {
		if !self.config.enabled {
			return Delivery::Disabled;
		}
		if !level.meets(self.config.min_level) {
			trace!(level = %level, min_level = %self.config.min_level, "below reporting threshold");
			return Delivery::BelowThreshold;
		}

		let tags = (!event.is_exception()).then(|| TagSet::from(vec![level.tag().to_string()]));
		self.dispatch(event, tags, access)
	}

	/// Writes the final error of a dying process. Ignores the level
	/// threshold; forwards only fatal severities, without tags.
	pub fn write_fatal(&self, record: ErrorRecord) -> Delivery {
		self.write_fatal_with(record, SinkAccess::Block)
	}

	/// As [`write_fatal`](Self::write_fatal), waiting at most one request
	/// timeout for a sink held by another thread.
	pub(crate) fn write_fatal_bounded(&self, record: ErrorRecord) -> Delivery {
		self.write_fatal_with(record, SinkAccess::WaitFor(self.config.request_timeout))
	}

	fn write_fatal_with(&self, record: ErrorRecord, access: SinkAccess) -> Delivery {
		if !self.config.enabled {
			return Delivery::Disabled;
		}
		let code = record.severity.unwrap_or(0);
		if !severity::is_fatal(code) {
			debug!(severity = code, "last error is not fatal, not reporting");
			return Delivery::NotFatal;
		}
		self.dispatch(RawEvent::Error(record), None, access)
	}

	fn dispatch(&self, event: RawEvent, tags: Option<TagSet>, access: SinkAccess) -> Delivery {
		let Some(_guard) = PipelineGuard::enter() else {
			return Delivery::Reentrant;
		};

		let user = self.current_user();
		let report = normalize(event);

		// Structured context captured with the event seeds the custom data.
		let context = match &report.trace {
			Some(Value::Object(fields)) => Some(fields.clone()),
			_ => None,
		};

		let (tags, mut custom_data) = run_processors(&self.processors, tags, context);
		if let Some(data) = custom_data.as_mut() {
			let redacted = filter_custom_data_in_place(data, &self.config.filter_rules);
			if redacted > 0 {
				trace!(redacted, "redacted sensitive custom data");
			}
		}

		let Some(mut sink) = self.acquire_sink(access) else {
			debug!("report sink busy on another thread, dropping event");
			return Delivery::Reentrant;
		};
		sink.set_user(user.as_ref());

		let result = if report.is_exception() {
			sink.send_exception(&report, tags.as_ref(), custom_data.as_ref())
		} else {
			sink.send_error(
				report.severity,
				&report.message,
				&report.file,
				report.line,
				tags.as_ref(),
				custom_data.as_ref(),
			)
		};

		match result {
			Ok(()) => Delivery::Sent,
			Err(e) => {
				warn!(error = %e, "failed to send crash report");
				Delivery::Failed
			}
		}
	}

	fn acquire_sink(&self, access: SinkAccess) -> Option<MutexGuard<'_, Box<dyn ReportSink>>> {
		match access {
			SinkAccess::Block => Some(self.sink.lock()),
			SinkAccess::Try => self.sink.try_lock(),
			SinkAccess::WaitFor(timeout) => self.sink.try_lock_for(timeout),
		}
	}

	fn current_user(&self) -> Option<UserIdentity> {
		if self.config.disable_user_tracking {
			return None;
		}
		self.user_provider.as_ref()?.current_user()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::enrich::{processor_fn, ProcessorRegistry};
	use crate::error::SinkError;
	use faultline_core::{CustomData, ExceptionRecord, NormalizedReport};
	use faultline_redact::FilterRuleSet;
	use proptest::prelude::*;
	use serde_json::json;

	#[derive(Debug, Clone, PartialEq)]
	enum Call {
		Error {
			severity: i64,
			message: String,
			tags: Option<Vec<String>>,
			custom: Option<CustomData>,
		},
		Exception {
			message: String,
			tags: Option<Vec<String>>,
		},
		User(Option<String>),
		Proxy(String),
		Filter(usize),
	}

	#[derive(Clone, Default)]
	struct Recorder(Arc<Mutex<Vec<Call>>>);

	impl Recorder {
		fn calls(&self) -> Vec<Call> {
			self.0.lock().clone()
		}
	}

	impl ReportSink for Recorder {
		fn send_error(
			&mut self,
			severity: i64,
			message: &str,
			_file: &str,
			_line: u32,
			tags: Option<&TagSet>,
			custom_data: Option<&CustomData>,
		) -> Result<(), SinkError> {
			self.0.lock().push(Call::Error {
				severity,
				message: message.to_string(),
				tags: tags.map(|t| t.clone().into_vec()),
				custom: custom_data.cloned(),
			});
			Ok(())
		}

		fn send_exception(
			&mut self,
			report: &NormalizedReport,
			tags: Option<&TagSet>,
			_custom_data: Option<&CustomData>,
		) -> Result<(), SinkError> {
			self.0.lock().push(Call::Exception {
				message: report.message.clone(),
				tags: tags.map(|t| t.clone().into_vec()),
			});
			Ok(())
		}

		fn set_user(&mut self, user: Option<&UserIdentity>) {
			self.0.lock().push(Call::User(user.map(|u| u.email.clone())));
		}

		fn set_proxy(&mut self, host_port: &str) -> Result<(), SinkError> {
			self.0.lock().push(Call::Proxy(host_port.to_string()));
			Ok(())
		}

		fn set_filter_params(&mut self, rules: &FilterRuleSet) {
			self.0.lock().push(Call::Filter(rules.len()));
		}
	}

	fn writer(config: ReporterConfig, registry: ProcessorRegistry) -> (ReportWriter, Recorder) {
		let recorder = Recorder::default();
		let writer = ReportWriter::new(config, Box::new(recorder.clone()), registry.freeze(), None);
		(writer, recorder)
	}

	fn sends(recorder: &Recorder) -> Vec<Call> {
		recorder
			.calls()
			.into_iter()
			.filter(|c| matches!(c, Call::Error { .. } | Call::Exception { .. }))
			.collect()
	}

	#[test]
	fn construction_pushes_filter_rules_and_proxy() {
		let config = ReporterConfig {
			proxy: Some(faultline_config::ProxyConfig {
				host: "proxy.internal".to_string(),
				port: Some(3128),
			}),
			..Default::default()
		};
		let (_writer, recorder) = writer(config, ProcessorRegistry::new());
		assert_eq!(
			recorder.calls(),
			vec![
				Call::Filter(faultline_redact::DEFAULT_RULES.len()),
				Call::Proxy("proxy.internal:3128".to_string())
			]
		);
	}

	#[test]
	fn error_events_get_level_tag() {
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());
		let delivery = writer.write(
			ErrorRecord::new("disk full").with_severity(severity::USER_ERROR).into(),
			LogLevel::Error,
		);
		assert_eq!(delivery, Delivery::Sent);
		assert_eq!(
			sends(&recorder),
			vec![Call::Error {
				severity: severity::USER_ERROR,
				message: "disk full".to_string(),
				tags: Some(vec!["ERR".to_string()]),
				custom: None,
			}]
		);
	}

	#[test]
	fn exceptions_start_without_tags() {
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());
		writer.write(ExceptionRecord::new("IoError", "read failed").into(), LogLevel::Error);
		assert_eq!(
			sends(&recorder),
			vec![Call::Exception {
				message: "IoError: read failed".to_string(),
				tags: None,
			}]
		);
	}

	#[test]
	fn below_threshold_is_dropped() {
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());
		let delivery = writer.write(ErrorRecord::new("fyi").into(), LogLevel::Info);
		assert_eq!(delivery, Delivery::BelowThreshold);
		assert!(sends(&recorder).is_empty());
	}

	#[test]
	fn disabled_config_drops_everything() {
		let config = ReporterConfig {
			enabled: false,
			..Default::default()
		};
		let (writer, recorder) = writer(config, ProcessorRegistry::new());
		assert_eq!(
			writer.write(ErrorRecord::new("boom").into(), LogLevel::Error),
			Delivery::Disabled
		);
		assert_eq!(
			writer.write_fatal(ErrorRecord::new("boom").with_severity(severity::ERROR)),
			Delivery::Disabled
		);
		assert!(sends(&recorder).is_empty());
	}

	#[test]
	fn custom_data_is_filtered_before_sink() {
		let mut registry = ProcessorRegistry::new();
		registry.register(processor_fn("login", |tags, _| {
			let mut custom = CustomData::new();
			custom.insert("password".to_string(), json!("hunter2"));
			custom.insert("user".to_string(), json!("bob"));
			Ok((tags, Some(custom)))
		}));
		let (writer, recorder) = writer(ReporterConfig::default(), registry);
		writer.write(ErrorRecord::new("login failed").into(), LogLevel::Error);

		let Call::Error { custom, .. } = &sends(&recorder)[0] else {
			panic!("expected an error send");
		};
		let custom = custom.as_ref().unwrap();
		assert_eq!(custom["password"], json!(faultline_redact::REDACTED));
		assert_eq!(custom["user"], json!("bob"));
	}

	#[test]
	fn fatal_path_forwards_only_fatal_severities() {
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());

		assert_eq!(
			writer.write_fatal(ErrorRecord::new("deprecated call").with_severity(severity::NOTICE)),
			Delivery::NotFatal
		);
		assert_eq!(
			writer.write_fatal(ErrorRecord::new("out of memory").with_severity(severity::ERROR)),
			Delivery::Sent
		);

		assert_eq!(
			sends(&recorder),
			vec![Call::Error {
				severity: severity::ERROR,
				message: "out of memory".to_string(),
				tags: None,
				custom: None,
			}]
		);
	}

	#[test]
	fn user_tracking_respects_config() {
		let provider: Arc<dyn UserProvider> = Arc::new(|| Some(UserIdentity::new("ada@example.com")));

		for (disabled, expect_user) in [(false, true), (true, false)] {
			let recorder = Recorder::default();
			let config = ReporterConfig {
				disable_user_tracking: disabled,
				..Default::default()
			};
			let writer = ReportWriter::new(
				config,
				Box::new(recorder.clone()),
				ProcessorRegistry::new().freeze(),
				Some(provider.clone()),
			);
			writer.write(ErrorRecord::new("boom").into(), LogLevel::Error);

			let saw_user = recorder
				.calls()
				.contains(&Call::User(Some("ada@example.com".to_string())));
			assert_eq!(saw_user, expect_user);
		}
	}

	#[test]
	fn user_is_cleared_when_provider_has_none() {
		let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
		let seen = calls.clone();
		let provider: Arc<dyn UserProvider> = Arc::new(move || {
			let n = seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
			(n == 0).then(|| UserIdentity::new("ada@example.com"))
		});

		let recorder = Recorder::default();
		let writer = ReportWriter::new(
			ReporterConfig::default(),
			Box::new(recorder.clone()),
			ProcessorRegistry::new().freeze(),
			Some(provider),
		);
		writer.write(ErrorRecord::new("signed-in request failed").into(), LogLevel::Error);
		writer.write(ErrorRecord::new("anonymous request failed").into(), LogLevel::Error);

		let users: Vec<Call> = recorder
			.calls()
			.into_iter()
			.filter(|c| matches!(c, Call::User(_)))
			.collect();
		assert_eq!(
			users,
			vec![Call::User(Some("ada@example.com".to_string())), Call::User(None)]
		);
	}

	#[test]
	fn event_context_seeds_custom_data() {
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());
		let record = ErrorRecord::new("payment declined")
			.with_context(json!({ "order_id": 4242, "card_token": "tok_123" }));
		writer.write(record.into(), LogLevel::Error);

		let Call::Error { custom, .. } = &sends(&recorder)[0] else {
			panic!("expected an error send");
		};
		let custom = custom.as_ref().unwrap();
		assert_eq!(custom["order_id"], json!(4242));
		assert_eq!(custom["card_token"], json!(faultline_redact::REDACTED));
	}

	#[test]
	fn processors_see_event_context() {
		let mut registry = ProcessorRegistry::new();
		registry.register(processor_fn("order-tag", |tags, custom| {
			let mut tags = tags.unwrap_or_default();
			if let Some(order) = custom.as_ref().and_then(|c| c.get("order_id")) {
				tags.insert(format!("order:{order}"));
			}
			Ok((Some(tags), custom))
		}));
		let (writer, recorder) = writer(ReporterConfig::default(), registry);
		let record = ErrorRecord::new("payment declined").with_context(json!({ "order_id": 7 }));
		writer.write(record.into(), LogLevel::Error);

		let Call::Error { tags, .. } = &sends(&recorder)[0] else {
			panic!("expected an error send");
		};
		assert!(tags.as_ref().unwrap().contains(&"order:7".to_string()));
	}

	#[test]
	fn busy_sink_drops_non_blocking_writes() {
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());
		let held = writer.sink.lock();

		let event = || RawEvent::from(ErrorRecord::new("from another thread"));
		assert_eq!(
			writer.write_with(event(), LogLevel::Error, SinkAccess::Try),
			Delivery::Reentrant
		);
		assert_eq!(
			writer.write_with(
				event(),
				LogLevel::Error,
				SinkAccess::WaitFor(Duration::from_millis(10))
			),
			Delivery::Reentrant
		);

		drop(held);
		assert!(sends(&recorder).is_empty());
		assert_eq!(
			writer.write_with(event(), LogLevel::Error, SinkAccess::Try),
			Delivery::Sent
		);
	}

	#[test]
	fn pipeline_is_not_reentrant_on_one_thread() {
		let _guard = PipelineGuard::enter().unwrap();
		assert!(in_pipeline());
		let (writer, recorder) = writer(ReporterConfig::default(), ProcessorRegistry::new());
		assert_eq!(
			writer.write(ErrorRecord::new("nested").into(), LogLevel::Error),
			Delivery::Reentrant
		);
		assert!(sends(&recorder).is_empty());
	}

	fn level_strategy() -> impl Strategy<Value = LogLevel> {
		prop_oneof![
			Just(LogLevel::Error),
			Just(LogLevel::Warn),
			Just(LogLevel::Notice),
			Just(LogLevel::Info),
			Just(LogLevel::Debug),
		]
	}

	proptest! {
		#[test]
		fn sent_iff_level_meets_threshold(level in level_strategy(), min_level in level_strategy()) {
			let config = ReporterConfig {
				min_level,
				..Default::default()
			};
			let (writer, recorder) = writer(config, ProcessorRegistry::new());
			let delivery = writer.write(ErrorRecord::new("event").into(), level);

			prop_assert_eq!(delivery == Delivery::Sent, level.meets(min_level));
			prop_assert_eq!(sends(&recorder).len(), usize::from(level.meets(min_level)));
		}
	}
}
