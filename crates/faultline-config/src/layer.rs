// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layers and the resolved configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use faultline_core::LogLevel;
use faultline_redact::FilterRuleSet;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::secret::ApiKey;

pub const DEFAULT_ENDPOINT: &str = "https://api.raygun.com/entries";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Outbound proxy for the report sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
	pub host: String,
	pub port: Option<u16>,
}

impl ProxyConfig {
	/// `host` or `host:port`.
	pub fn host_port(&self) -> String {
		match self.port {
			Some(port) => format!("{}:{}", self.host, port),
			None => self.host.clone(),
		}
	}
}

/// Reporter configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct ReporterConfig {
	/// Explicitly configured API key; the highest priority credential source.
	pub api_key: Option<ApiKey>,
	/// When false nothing is reported, even with a valid key.
	pub enabled: bool,
	/// Least severe log level that is reported.
	pub min_level: LogLevel,
	pub proxy: Option<ProxyConfig>,
	pub disable_user_tracking: bool,
	pub environment: String,
	pub endpoint: String,
	pub request_timeout: Duration,
	pub filter_rules: FilterRuleSet,
}

impl ReporterConfig {
	/// `production` and `live` deployments count as production.
	pub fn is_production(&self) -> bool {
		matches!(
			self.environment.to_ascii_lowercase().as_str(),
			"production" | "live"
		)
	}
}

impl Default for ReporterConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			enabled: true,
			min_level: LogLevel::default(),
			proxy: None,
			disable_user_tracking: false,
			environment: DEFAULT_ENVIRONMENT.to_string(),
			endpoint: DEFAULT_ENDPOINT.to_string(),
			request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
			filter_rules: FilterRuleSet::defaults(),
		}
	}
}

/// Reporter configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReporterConfigLayer {
	#[serde(default)]
	pub api_key: Option<ApiKey>,
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub min_level: Option<LogLevel>,
	#[serde(default)]
	pub proxy_host: Option<String>,
	#[serde(default)]
	pub proxy_port: Option<u16>,
	#[serde(default)]
	pub disable_user_tracking: Option<bool>,
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub endpoint: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	/// Replaces the default rules entirely when present.
	#[serde(default)]
	pub filter_params: Option<BTreeMap<String, bool>>,
}

impl ReporterConfigLayer {
	pub fn merge(&mut self, other: ReporterConfigLayer) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.min_level.is_some() {
			self.min_level = other.min_level;
		}
		if other.proxy_host.is_some() {
			self.proxy_host = other.proxy_host;
		}
		if other.proxy_port.is_some() {
			self.proxy_port = other.proxy_port;
		}
		if other.disable_user_tracking.is_some() {
			self.disable_user_tracking = other.disable_user_tracking;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.filter_params.is_some() {
			self.filter_params = other.filter_params;
		}
	}

	pub fn finalize(self) -> Result<ReporterConfig, ConfigError> {
		let filter_rules = match self.filter_params {
			Some(params) => FilterRuleSet::from_pairs(params)?,
			None => FilterRuleSet::defaults(),
		};

		let proxy = self
			.proxy_host
			.filter(|h| !h.trim().is_empty())
			.map(|host| ProxyConfig {
				host,
				port: self.proxy_port,
			});

		Ok(ReporterConfig {
			api_key: self.api_key.filter(|k| !k.is_blank()),
			enabled: self.enabled.unwrap_or(true),
			min_level: self.min_level.unwrap_or_default(),
			proxy,
			disable_user_tracking: self.disable_user_tracking.unwrap_or(false),
			environment: self
				.environment
				.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
			endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
			request_timeout: Duration::from_secs(
				self.request_timeout_secs
					.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			),
			filter_rules,
		})
	}
}
