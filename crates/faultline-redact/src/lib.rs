// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redaction of sensitive fields in outgoing crash reports.
//!
//! A [`FilterRuleSet`] names fields by literal key or by `/pattern/flags`
//! regular expression. Filtering replaces the *value* of every matching entry
//! with [`REDACTED`]; keys are never removed. Only the top level of a payload
//! is inspected: nested objects are passed through untouched.

mod rule;

pub use rule::{FilterRule, FilterRuleSet, DEFAULT_RULES};

use faultline_core::CustomData;
use serde_json::Value;
use std::collections::BTreeMap;

/// The marker written in place of a redacted value.
pub const REDACTED: &str = "<redacted>";

#[derive(Debug, thiserror::Error)]
pub enum RedactError {
	#[error("invalid filter pattern {rule}: {source}")]
	InvalidPattern {
		rule: String,
		#[source]
		source: regex::Error,
	},

	#[error("unsupported flag '{flag}' in filter pattern {rule}")]
	UnsupportedFlag { rule: String, flag: char },
}

/// Returns a copy of `payload` with the value of every entry whose key or
/// value matches a redacting rule replaced by [`REDACTED`].
pub fn filter_params(
	payload: &BTreeMap<String, String>,
	rules: &FilterRuleSet,
) -> BTreeMap<String, String> {
	payload
		.iter()
		.map(|(key, value)| {
			let value = if rules.is_sensitive(key) || rules.is_sensitive(value) {
				REDACTED.to_string()
			} else {
				value.clone()
			};
			(key.clone(), value)
		})
		.collect()
}

/// Applies the rules to the top level of `data` in place. Returns the number
/// of values replaced.
pub fn filter_custom_data_in_place(data: &mut CustomData, rules: &FilterRuleSet) -> usize {
	let mut replaced = 0;
	for (key, value) in data.iter_mut() {
		if is_redacted(value) {
			continue;
		}
		let sensitive_value = value.as_str().is_some_and(|s| rules.is_sensitive(s));
		if rules.is_sensitive(key) || sensitive_value {
			*value = Value::String(REDACTED.to_string());
			replaced += 1;
		}
	}
	replaced
}

/// Returns a filtered copy of `data`.
pub fn filter_custom_data(data: &CustomData, rules: &FilterRuleSet) -> CustomData {
	let mut cloned = data.clone();
	filter_custom_data_in_place(&mut cloned, rules);
	cloned
}

fn is_redacted(value: &Value) -> bool {
	value.as_str() == Some(REDACTED)
}
