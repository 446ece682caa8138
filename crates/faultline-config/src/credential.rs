// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API key resolution across tiered sources.
//!
//! Sources are consulted in a fixed order and the first non-blank value wins:
//!
//! 1. the configured key ([`ReporterConfig::api_key`])
//! 2. the key compiled in through the `FAULTLINE_APP_KEY` build variable
//! 3. the per-site settings record, read only once the settings store
//!    reports it is ready
//!
//! No key is a valid outcome: reporting stays disabled.

use thiserror::Error;
use tracing::{debug, warn};

use crate::layer::ReporterConfig;
use crate::secret::ApiKey;

/// Key compiled into the binary, if `FAULTLINE_APP_KEY` was set at build time.
pub const BUILD_APP_KEY: Option<&str> = option_env!("FAULTLINE_APP_KEY");

/// Kinds of persisted records whose readiness can be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
	SiteSettings,
}

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("settings store unavailable: {0}")]
	Unavailable(String),

	#[error("settings query failed: {0}")]
	Query(String),
}

/// Persisted per-site settings holding an API key.
pub trait SettingsStore: Send + Sync {
	/// True once every table and column backing `kind` exists.
	fn is_store_ready(&self, kind: StoreKind) -> bool;

	fn api_key(&self) -> Result<Option<String>, SettingsError>;
}

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
	Config,
	BuildConstant,
	Settings,
}

/// The winning key and its source.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
	pub key: ApiKey,
	pub source: CredentialSource,
}

/// Resolves the API key from the configured sources.
pub struct CredentialResolver<'a> {
	config: &'a ReporterConfig,
	build_constant: Option<&'a str>,
	store: Option<&'a dyn SettingsStore>,
}

impl<'a> CredentialResolver<'a> {
	pub fn new(config: &'a ReporterConfig) -> Self {
		Self {
			config,
			build_constant: BUILD_APP_KEY,
			store: None,
		}
	}

	/// Overrides the compiled-in key.
	pub fn build_constant(mut self, key: Option<&'a str>) -> Self {
		self.build_constant = key;
		self
	}

	pub fn settings_store(mut self, store: &'a dyn SettingsStore) -> Self {
		self.store = Some(store);
		self
	}

	/// Resolves the key. Never fails; a source that cannot be read counts as
	/// empty. Warns when a production deployment ends up without a key.
	pub fn resolve(&self) -> Option<ResolvedCredential> {
		let resolved = self
			.from_config()
			.or_else(|| self.from_build_constant())
			.or_else(|| self.from_settings());

		match &resolved {
			Some(credential) => {
				debug!(source = ?credential.source, "crash reporting API key resolved");
			}
			None if self.config.is_production() => {
				warn!(
					environment = %self.config.environment,
					"crash reporting installed but no API key is configured; reports will not be sent"
				);
			}
			None => {
				debug!("no crash reporting API key configured; reporting disabled");
			}
		}

		resolved
	}

	fn from_config(&self) -> Option<ResolvedCredential> {
		let key = self.config.api_key.as_ref().filter(|k| !k.is_blank())?;
		Some(ResolvedCredential {
			key: key.clone(),
			source: CredentialSource::Config,
		})
	}

	fn from_build_constant(&self) -> Option<ResolvedCredential> {
		let key = self.build_constant.filter(|k| !k.trim().is_empty())?;
		Some(ResolvedCredential {
			key: ApiKey::new(key.to_string()),
			source: CredentialSource::BuildConstant,
		})
	}

	fn from_settings(&self) -> Option<ResolvedCredential> {
		let store = self.store?;

		if !store.is_store_ready(StoreKind::SiteSettings) {
			debug!("settings store not ready, skipping stored API key");
			return None;
		}

		match store.api_key() {
			Ok(Some(key)) if !key.trim().is_empty() => Some(ResolvedCredential {
				key: ApiKey::new(key),
				source: CredentialSource::Settings,
			}),
			Ok(_) => None,
			Err(e) => {
				debug!(error = %e, "failed to read stored API key");
				None
			}
		}
	}
}
