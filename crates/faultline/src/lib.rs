// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Crash reporting bridge.
//!
//! Captures failures from `tracing` events, panics and explicit calls,
//! enriches them with tags and custom data, strips sensitive values and
//! forwards them to a reporting service.
//!
//! # Example
//!
//! ```ignore
//! use faultline::{processor_fn, Reporter};
//! use tracing_subscriber::prelude::*;
//!
//! let config = faultline_config::load_config()?;
//! let reporter = Reporter::builder(config)
//!     .processor(processor_fn("release", |tags, custom| {
//!         let mut tags = tags.unwrap_or_default();
//!         tags.insert("release:2025.1");
//!         Ok((Some(tags), custom))
//!     }))
//!     .build()?;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(reporter.layer())
//!     .init();
//! reporter.install_panic_hook();
//!
//! if let Err(e) = do_something() {
//!     reporter.capture_error(&e);
//! }
//! ```

pub mod backtrace;
pub mod enrich;
pub mod error;
pub mod http;
pub mod layer;
pub mod panic_hook;
pub mod sink;
pub mod user;
pub mod writer;

use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::Arc;

use faultline_config::{CredentialResolver, CredentialSource, ReporterConfig, SettingsStore};
use faultline_core::{ErrorRecord, ExceptionRecord, ExceptionTypes, LogLevel, RawEvent};
use tracing::{info, warn};

use crate::writer::SinkAccess;

pub use enrich::{
	processor_fn, run_processors, Enrichment, FnProcessor, LogProcessor, ProcessorRegistry,
	Processors,
};
pub use error::{FaultlineError, ProcessorError, Result, SinkError};
pub use http::HttpSink;
pub use layer::ReportingLayer;
pub use sink::ReportSink;
pub use user::{UserIdentity, UserProvider};
pub use writer::{Delivery, ReportWriter};

struct ReporterInner {
	writer: ReportWriter,
	exception_types: ExceptionTypes,
	credential_source: CredentialSource,
}

/// Handle to the reporting pipeline.
///
/// Cheap to clone. A reporter built without a resolvable API key is inert:
/// every capture returns [`Delivery::Inactive`] and the sink is never
/// touched. Capture methods never panic and never return errors.
#[derive(Clone, Default)]
pub struct Reporter {
	inner: Option<Arc<ReporterInner>>,
}

impl Reporter {
	pub fn builder(config: ReporterConfig) -> ReporterBuilder {
		ReporterBuilder::new(config)
	}

	/// Builds a reporter from configuration alone.
	pub fn init(config: ReporterConfig) -> Result<Self> {
		Self::builder(config).build()
	}

	/// Loads configuration from the default sources and builds a reporter.
	pub fn from_env() -> Result<Self> {
		Self::init(faultline_config::load_config()?)
	}

	/// A reporter that drops everything.
	pub fn inactive() -> Self {
		Self { inner: None }
	}

	pub fn is_active(&self) -> bool {
		self.inner.is_some()
	}

	/// Where the API key came from, if one resolved.
	pub fn credential_source(&self) -> Option<CredentialSource> {
		self.inner.as_ref().map(|inner| inner.credential_source)
	}

	/// True if an event at `level` would be reported.
	pub fn accepts(&self, level: LogLevel) -> bool {
		self.inner.as_ref().is_some_and(|inner| {
			let config = inner.writer.config();
			config.enabled && level.meets(config.min_level)
		})
	}

	/// Reclassifies `Uncaught <Type>: ...` messages of known exception types.
	pub fn classify(&self, record: ErrorRecord) -> RawEvent {
		match &self.inner {
			Some(inner) => inner.exception_types.classify(record),
			None => RawEvent::Error(record),
		}
	}

	/// Reports an event logged at `level`.
	pub fn report(&self, event: RawEvent, level: LogLevel) -> Delivery {
		let Some(inner) = &self.inner else {
			return Delivery::Inactive;
		};
		guarded(|| inner.writer.write(event, level))
	}

	/// Reports an event from the tracing layer. Dropped rather than queued
	/// when another thread holds the sink.
	pub(crate) fn report_captured(&self, event: RawEvent, level: LogLevel) -> Delivery {
		let Some(inner) = &self.inner else {
			return Delivery::Inactive;
		};
		guarded(|| inner.writer.write_with(event, level, SinkAccess::Try))
	}

	/// Reports the final error of a dying process. Only fatal severities are
	/// forwarded; the level threshold does not apply.
	pub fn report_fatal(&self, record: ErrorRecord) -> Delivery {
		let Some(inner) = &self.inner else {
			return Delivery::Inactive;
		};
		guarded(|| inner.writer.write_fatal(record))
	}

	/// Reports a panic from the panic hook, waiting at most one request
	/// timeout for the sink.
	pub(crate) fn report_panic(&self, record: ErrorRecord) -> Delivery {
		let Some(inner) = &self.inner else {
			return Delivery::Inactive;
		};
		guarded(|| inner.writer.write_fatal_bounded(record))
	}

	/// Reports an error value as an exception at the caller's location.
	///
	/// The exception type is the Rust type name of `E`. For trait objects such
	/// as `&*Box<dyn Error>` that is the trait object's name rather than the
	/// concrete error; use [`Reporter::capture_error_named`] there.
	#[track_caller]
	pub fn capture_error<E>(&self, error: &E) -> Delivery
	where
		E: std::error::Error + ?Sized,
	{
		let type_name = std::any::type_name::<E>();
		self.capture_exception(type_name, error_chain(error), Location::caller())
	}

	/// Reports an error value as an exception of the given type.
	#[track_caller]
	pub fn capture_error_named<E>(&self, type_name: &str, error: &E) -> Delivery
	where
		E: std::error::Error + ?Sized,
	{
		self.capture_exception(type_name, error_chain(error), Location::caller())
	}

	fn capture_exception(
		&self,
		type_name: &str,
		message: String,
		location: &Location<'_>,
	) -> Delivery {
		if !self.accepts(LogLevel::Error) {
			return self.skipped();
		}

		let mut record =
			ExceptionRecord::new(type_name, message).at(location.file(), location.line());
		if let Some(trace) = backtrace::capture_trace() {
			record = record.with_trace(trace);
		}
		self.report(record.into(), LogLevel::Error)
	}

	/// Reports a message at `level` from the caller's location.
	#[track_caller]
	pub fn capture_message(&self, message: impl Into<String>, level: LogLevel) -> Delivery {
		let location = Location::caller();
		let record = ErrorRecord::new(message)
			.with_severity(level.default_severity())
			.at(location.file(), location.line());
		self.report(self.classify(record), level)
	}

	/// A tracing layer feeding this reporter.
	pub fn layer(&self) -> ReportingLayer {
		ReportingLayer::new(self.clone())
	}

	/// Reports panics as fatal errors. Does nothing on an inactive reporter.
	pub fn install_panic_hook(&self) {
		if self.is_active() {
			panic_hook::install_panic_hook(self.clone());
		}
	}

	fn skipped(&self) -> Delivery {
		match &self.inner {
			None => Delivery::Inactive,
			Some(inner) if !inner.writer.config().enabled => Delivery::Disabled,
			Some(_) => Delivery::BelowThreshold,
		}
	}
}

/// The error's message followed by each of its sources, joined with `": "`.
fn error_chain<E>(error: &E) -> String
where
	E: std::error::Error + ?Sized,
{
	let mut message = error.to_string();
	let mut source = error.source();
	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());
		source = cause.source();
	}
	message
}

fn guarded(f: impl FnOnce() -> Delivery) -> Delivery {
	catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
		warn!(
			panic = %enrich::panic_message(payload.as_ref()),
			"crash reporting pipeline panicked"
		);
		Delivery::Failed
	})
}

/// Builder for [`Reporter`].
pub struct ReporterBuilder {
	config: ReporterConfig,
	build_constant: Option<String>,
	settings_store: Option<Arc<dyn SettingsStore>>,
	processors: ProcessorRegistry,
	user_provider: Option<Arc<dyn UserProvider>>,
	sink: Option<Box<dyn ReportSink>>,
	exception_types: ExceptionTypes,
}

impl ReporterBuilder {
	pub fn new(config: ReporterConfig) -> Self {
		Self {
			config,
			build_constant: faultline_config::BUILD_APP_KEY.map(str::to_string),
			settings_store: None,
			processors: ProcessorRegistry::new(),
			user_provider: None,
			sink: None,
			exception_types: ExceptionTypes::new(),
		}
	}

	/// Overrides the key compiled in through `FAULTLINE_APP_KEY`.
	pub fn build_constant(mut self, key: Option<&str>) -> Self {
		self.build_constant = key.map(str::to_string);
		self
	}

	pub fn settings_store(mut self, store: impl SettingsStore + 'static) -> Self {
		self.settings_store = Some(Arc::new(store));
		self
	}

	/// Appends an enrichment processor. Processors run in the order added.
	pub fn processor(mut self, processor: impl LogProcessor + 'static) -> Self {
		self.processors.register(processor);
		self
	}

	/// Replaces the processors added so far.
	pub fn processors(mut self, registry: ProcessorRegistry) -> Self {
		self.processors = registry;
		self
	}

	pub fn user_provider(mut self, provider: impl UserProvider + 'static) -> Self {
		self.user_provider = Some(Arc::new(provider));
		self
	}

	/// Uses `sink` instead of the default [`HttpSink`].
	pub fn sink(mut self, sink: impl ReportSink + 'static) -> Self {
		self.sink = Some(Box::new(sink));
		self
	}

	/// Registers an exception type for `Uncaught <Type>: ...` messages.
	pub fn exception_type(mut self, type_name: impl Into<String>) -> Self {
		self.exception_types = self.exception_types.register(type_name);
		self
	}

	/// Resolves the API key and builds the reporter. Without a key the
	/// reporter is inert and no sink is created.
	pub fn build(self) -> Result<Reporter> {
		let resolved = {
			let mut resolver = CredentialResolver::new(&self.config)
				.build_constant(self.build_constant.as_deref());
			if let Some(store) = self.settings_store.as_deref() {
				resolver = resolver.settings_store(store);
			}
			resolver.resolve()
		};

		let Some(credential) = resolved else {
			return Ok(Reporter::inactive());
		};

		let sink: Box<dyn ReportSink> = match self.sink {
			Some(sink) => sink,
			None => Box::new(HttpSink::new(&self.config, credential.key.clone())?),
		};

		info!(
			source = ?credential.source,
			environment = %self.config.environment,
			enabled = self.config.enabled,
			min_level = %self.config.min_level,
			processors = self.processors.len(),
			"crash reporting initialized"
		);

		let writer = ReportWriter::new(
			self.config,
			sink,
			self.processors.freeze(),
			self.user_provider,
		);

		Ok(Reporter {
			inner: Some(Arc::new(ReporterInner {
				writer,
				exception_types: self.exception_types,
				credential_source: credential.source,
			})),
		})
	}
}
