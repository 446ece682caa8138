// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the core data model.

use thiserror::Error;

/// Errors raised while parsing core types from text.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid log level: {0}")]
	InvalidLogLevel(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
