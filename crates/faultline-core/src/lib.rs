// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the faultline crash reporting bridge.
//!
//! This crate holds the data model shared by the configuration layer and the
//! reporting SDK:
//!
//! - [`RawEvent`]: a failure exactly as it was captured, either an
//!   exception-like record or a plain error record
//! - [`NormalizedReport`]: the canonical shape handed to a report sink,
//!   produced by [`normalize`]
//! - [`TagSet`] and [`CustomData`]: the structures enrichment processors mutate
//! - [`severity`] codes and [`LogLevel`] priorities
//! - [`ExceptionTypes`]: capture-time classification of raw error text

pub mod classify;
pub mod error;
pub mod event;
pub mod report;
pub mod severity;
pub mod tags;

pub use classify::{ExceptionTypes, BASE_EXCEPTION};
pub use error::{CoreError, Result};
pub use event::{ErrorRecord, ExceptionRecord, RawEvent};
pub use report::{normalize, NormalizedReport, ReportKind};
pub use severity::LogLevel;
pub use tags::{CustomData, TagSet};
