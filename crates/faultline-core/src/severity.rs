// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Numeric error severities and log priorities.
//!
//! Severities are bit flags understood by the receiving service. Log levels
//! are the priorities the host application logs at; the reporter's minimum
//! threshold is expressed as a [`LogLevel`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

pub const ERROR: i64 = 1;
pub const WARNING: i64 = 2;
pub const PARSE: i64 = 4;
pub const NOTICE: i64 = 8;
pub const CORE_ERROR: i64 = 16;
pub const CORE_WARNING: i64 = 32;
pub const COMPILE_ERROR: i64 = 64;
pub const COMPILE_WARNING: i64 = 128;
pub const USER_ERROR: i64 = 256;
pub const USER_WARNING: i64 = 512;
pub const USER_NOTICE: i64 = 1024;

/// Severities that terminate the process.
pub const FATAL_MASK: i64 = ERROR | CORE_ERROR | COMPILE_ERROR | USER_ERROR | PARSE;

/// Returns true if any fatal-grade bit is set.
pub fn is_fatal(severity: i64) -> bool {
	severity & FATAL_MASK != 0
}

/// Priority of a log event. Lower priority numbers are more severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	#[serde(alias = "err")]
	Error,
	#[default]
	#[serde(alias = "warning")]
	Warn,
	Notice,
	Info,
	Debug,
}

impl LogLevel {
	pub fn priority(self) -> u8 {
		match self {
			Self::Error => 3,
			Self::Warn => 4,
			Self::Notice => 5,
			Self::Info => 6,
			Self::Debug => 7,
		}
	}

	/// Returns true if `self` is at least as severe as `threshold`.
	pub fn meets(self, threshold: LogLevel) -> bool {
		self.priority() <= threshold.priority()
	}

	/// Label attached as the initial tag of plain error reports.
	pub fn tag(self) -> &'static str {
		match self {
			Self::Error => "ERR",
			Self::Warn => "WARN",
			Self::Notice => "NOTICE",
			Self::Info => "INFO",
			Self::Debug => "DEBUG",
		}
	}

	/// Severity code used when a captured event carries none of its own.
	pub fn default_severity(self) -> i64 {
		match self {
			Self::Error => USER_ERROR,
			Self::Warn => USER_WARNING,
			Self::Notice | Self::Info | Self::Debug => USER_NOTICE,
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Warn => write!(f, "warn"),
			Self::Notice => write!(f, "notice"),
			Self::Info => write!(f, "info"),
			Self::Debug => write!(f, "debug"),
		}
	}
}

impl FromStr for LogLevel {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"error" | "err" => Ok(Self::Error),
			"warn" | "warning" => Ok(Self::Warn),
			"notice" => Ok(Self::Notice),
			"info" => Ok(Self::Info),
			"debug" => Ok(Self::Debug),
			_ => Err(CoreError::InvalidLogLevel(s.to_string())),
		}
	}
}
