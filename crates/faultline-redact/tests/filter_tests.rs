// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use faultline_core::CustomData;
use faultline_redact::{filter_custom_data, filter_params, FilterRuleSet, REDACTED};
use serde_json::json;
use std::collections::BTreeMap;

fn server_vars() -> BTreeMap<String, String> {
	BTreeMap::from([
		("HTTP_COOKIE".to_string(), "session=abc".to_string()),
		("HTTP_AUTHORIZATION".to_string(), "Basic Zm9vOmJhcg==".to_string()),
		("PHP_AUTH_PW".to_string(), "hunter2".to_string()),
		("SS_DATABASE_USERNAME".to_string(), "root".to_string()),
		("REQUEST_URI".to_string(), "/admin".to_string()),
		("HTTP_USER_AGENT".to_string(), "curl/8.0".to_string()),
	])
}

#[test]
fn test_default_rules_scrub_server_variables() {
	let filtered = filter_params(&server_vars(), &FilterRuleSet::defaults());

	assert_eq!(filtered["HTTP_COOKIE"], REDACTED);
	assert_eq!(filtered["HTTP_AUTHORIZATION"], REDACTED);
	assert_eq!(filtered["PHP_AUTH_PW"], REDACTED);
	assert_eq!(filtered["SS_DATABASE_USERNAME"], REDACTED);
	assert_eq!(filtered["REQUEST_URI"], "/admin");
	assert_eq!(filtered["HTTP_USER_AGENT"], "curl/8.0");
}

#[test]
fn test_overridden_rules_replace_defaults() {
	let rules = FilterRuleSet::from_pairs([("REQUEST_URI", true)]).unwrap();
	let filtered = filter_params(&server_vars(), &rules);

	assert_eq!(filtered["REQUEST_URI"], REDACTED);
	assert_eq!(filtered["HTTP_COOKIE"], "session=abc");
}

#[test]
fn test_case_insensitive_pattern_matches_mixed_case_keys() {
	let mut data = CustomData::new();
	data.insert("ApiKey".into(), json!("k-123"));
	data.insert("build".into(), json!("1.4.2"));

	let filtered = filter_custom_data(&data, &FilterRuleSet::defaults());

	assert_eq!(filtered["ApiKey"], json!(REDACTED));
	assert_eq!(filtered["build"], json!("1.4.2"));
}
