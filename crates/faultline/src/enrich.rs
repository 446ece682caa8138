// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enrichment processors.
//!
//! Each processor receives the current tags and custom data and returns the
//! values to use from then on. Processors run in registration order, each
//! seeing the output of the previous one. A processor that fails or panics
//! is logged and skipped; the values it was given carry on unchanged.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use faultline_core::{CustomData, TagSet};
use tracing::warn;

use crate::error::ProcessorError;

/// Tags and custom data as produced by a processor.
pub type Enrichment = (Option<TagSet>, Option<CustomData>);

/// Frozen, shareable processor list.
pub type Processors = Arc<[Box<dyn LogProcessor>]>;

/// A unit that may add tags or custom data to a report.
pub trait LogProcessor: Send + Sync {
	/// Name used in diagnostics.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}

	fn process(
		&self,
		tags: Option<TagSet>,
		custom_data: Option<CustomData>,
	) -> Result<Enrichment, ProcessorError>;
}

/// A processor backed by a closure.
pub struct FnProcessor<F> {
	name: String,
	f: F,
}

impl<F> LogProcessor for FnProcessor<F>
where
	F: Fn(Option<TagSet>, Option<CustomData>) -> Result<Enrichment, ProcessorError> + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn process(
		&self,
		tags: Option<TagSet>,
		custom_data: Option<CustomData>,
	) -> Result<Enrichment, ProcessorError> {
		(self.f)(tags, custom_data)
	}
}

/// Wraps a closure as a named [`LogProcessor`].
pub fn processor_fn<F>(name: impl Into<String>, f: F) -> FnProcessor<F>
where
	F: Fn(Option<TagSet>, Option<CustomData>) -> Result<Enrichment, ProcessorError> + Send + Sync,
{
	FnProcessor {
		name: name.into(),
		f,
	}
}

/// Collects processors during start-up. Frozen into [`Processors`] when the
/// reporter is built; nothing can be added afterwards.
#[derive(Default)]
pub struct ProcessorRegistry {
	processors: Vec<Box<dyn LogProcessor>>,
}

impl ProcessorRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, processor: impl LogProcessor + 'static) -> &mut Self {
		self.processors.push(Box::new(processor));
		self
	}

	pub fn len(&self) -> usize {
		self.processors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.processors.is_empty()
	}

	pub fn freeze(self) -> Processors {
		Arc::from(self.processors)
	}
}

/// Runs every processor in order and returns the final tags and custom data.
pub fn run_processors(
	processors: &[Box<dyn LogProcessor>],
	mut tags: Option<TagSet>,
	mut custom_data: Option<CustomData>,
) -> Enrichment {
	for processor in processors {
		let (tags_in, custom_in) = (tags.clone(), custom_data.clone());
		match catch_unwind(AssertUnwindSafe(|| processor.process(tags_in, custom_in))) {
			Ok(Ok((next_tags, next_custom))) => {
				tags = next_tags;
				custom_data = next_custom;
			}
			Ok(Err(e)) => {
				warn!(processor = processor.name(), error = %e, "log processor failed, skipping");
			}
			Err(payload) => {
				warn!(
					processor = processor.name(),
					panic = %panic_message(payload.as_ref()),
					"log processor panicked, skipping"
				);
			}
		}
	}
	(tags, custom_data)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
