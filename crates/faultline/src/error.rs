// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the reporting SDK.
//!
//! Only [`FaultlineError`] ever reaches the host application, and only while
//! the reporter is being built. Errors on the per-event path are logged and
//! swallowed.

use thiserror::Error;

/// Result type alias for reporter construction.
pub type Result<T> = std::result::Result<T, FaultlineError>;

/// Errors raised while building a reporter.
#[derive(Debug, Error)]
pub enum FaultlineError {
	#[error("configuration error: {0}")]
	Config(#[from] faultline_config::ConfigError),

	#[error("failed to create report sink: {0}")]
	Sink(#[from] SinkError),
}

/// Errors raised by a report sink.
#[derive(Debug, Error)]
pub enum SinkError {
	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Error message from server.
		message: String,
	},

	#[error("invalid proxy {proxy}: {message}")]
	InvalidProxy { proxy: String, message: String },
}

/// Error returned by an enrichment processor.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessorError {
	message: String,
}

impl ProcessorError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
