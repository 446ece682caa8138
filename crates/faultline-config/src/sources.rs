// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file, the environment,
//! and explicit values supplied by the host application.

use std::path::PathBuf;

use faultline_core::LogLevel;
use tracing::{debug, trace};

use crate::env::{env_bool, env_parse, env_var, load_secret_env};
use crate::error::ConfigError;
use crate::layer::ReporterConfigLayer;

/// Default location of the configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/faultline/faultline.toml";

/// Default prefix of environment variables.
pub const ENV_PREFIX: &str = "FAULTLINE_";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	Explicit = 100,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ReporterConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ReporterConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ReporterConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ReporterConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `<PREFIX>API_KEY` (or `<PREFIX>API_KEY_FILE`), `<PREFIX>ENABLED`,
/// `<PREFIX>LEVEL`, `<PREFIX>PROXY_HOST`, `<PREFIX>PROXY_PORT`,
/// `<PREFIX>DISABLE_USER_TRACKING`, `<PREFIX>ENV`, `<PREFIX>ENDPOINT`,
/// `<PREFIX>REQUEST_TIMEOUT_SECS`.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	fn key(&self, name: &str) -> String {
		format!("{}{}", self.prefix, name)
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::with_prefix(ENV_PREFIX)
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		debug!(prefix = %self.prefix, "loading environment variables");

		let level_key = self.key("LEVEL");
		let min_level = match env_var(&level_key) {
			Some(v) => Some(v.parse::<LogLevel>().map_err(|e| ConfigError::InvalidValue {
				key: level_key.clone(),
				message: e.to_string(),
			})?),
			None => None,
		};

		Ok(ReporterConfigLayer {
			api_key: load_secret_env(&self.key("API_KEY"))?,
			enabled: env_bool(&self.key("ENABLED")),
			min_level,
			proxy_host: env_var(&self.key("PROXY_HOST")),
			proxy_port: env_parse(&self.key("PROXY_PORT"))?,
			disable_user_tracking: env_bool(&self.key("DISABLE_USER_TRACKING")),
			environment: env_var(&self.key("ENV")),
			endpoint: env_var(&self.key("ENDPOINT")),
			request_timeout_secs: env_parse(&self.key("REQUEST_TIMEOUT_SECS"))?,
			filter_params: None,
		})
	}
}

/// Values set in code by the host application. Overrides every other
/// source.
pub struct ExplicitSource {
	layer: ReporterConfigLayer,
}

impl ExplicitSource {
	pub fn new(layer: ReporterConfigLayer) -> Self {
		Self { layer }
	}
}

impl ConfigSource for ExplicitSource {
	fn name(&self) -> &'static str {
		"explicit"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Explicit
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}
