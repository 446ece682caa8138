// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the faultline crash reporting bridge.
//!
//! This crate provides:
//! - Layered configuration from built-in defaults, a TOML file, `FAULTLINE_*`
//!   environment variables and explicit values set in code
//! - [`Secret`] / [`ApiKey`], which never print their value
//! - [`CredentialResolver`], which picks the active API key from the
//!   configuration, a build-time constant or a persisted settings record
//!
//! # Usage
//!
//! ```ignore
//! use faultline_config::{load_config, CredentialResolver};
//!
//! let config = load_config()?;
//! let credential = CredentialResolver::new(&config).resolve();
//! ```

pub mod credential;
pub mod env;
pub mod error;
pub mod layer;
pub mod secret;
pub mod sources;

pub use credential::{
	CredentialResolver, CredentialSource, ResolvedCredential, SettingsError, SettingsStore,
	StoreKind, BUILD_APP_KEY,
};
pub use error::ConfigError;
pub use layer::{ProxyConfig, ReporterConfig, ReporterConfigLayer};
pub use secret::{ApiKey, Secret, REDACTED};
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, ExplicitSource, Precedence, TomlSource,
};

use tracing::{debug, info};

/// Load configuration from defaults, the system TOML file and the
/// environment.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`FAULTLINE_*`)
/// 2. Config file (`/etc/faultline/faultline.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ReporterConfig, ConfigError> {
	load_config_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::default()),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ReporterConfig, ConfigError> {
	load_config_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::default()),
	])
}

/// Load configuration from an arbitrary set of sources, merged in
/// precedence order.
pub fn load_config_from(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ReporterConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ReporterConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let config = merged.finalize()?;

	info!(
		enabled = config.enabled,
		min_level = %config.min_level,
		environment = %config.environment,
		api_key_configured = config.api_key.is_some(),
		proxy_configured = config.proxy.is_some(),
		user_tracking = !config.disable_user_tracking,
		filter_rules = config.filter_rules.len(),
		"Crash reporting configuration loaded"
	);

	Ok(config)
}
