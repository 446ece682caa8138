// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::RedactError;

const REGEX_SIZE_LIMIT: usize = 1024 * 1024;

/// Rules shipped when the configuration does not override them.
pub const DEFAULT_RULES: &[&str] = &[
	"/SS_DATABASE_USERNAME/",
	"/SS_DEFAULT_ADMIN_USERNAME/",
	"/KEY/i",
	"/TOKEN/i",
	"/PASSWORD/i",
	"/SECRET/i",
	"/HTTP_AUTHORIZATION/",
	"/PHP_AUTH_PW/",
	"/HTTP_COOKIE/",
	"Authorization",
	"Cookie",
];

#[derive(Clone)]
enum Matcher {
	Literal(String),
	Pattern(Regex),
}

/// A single filter rule: a literal name or a `/pattern/flags` regular
/// expression, and whether matches are redacted.
#[derive(Clone)]
pub struct FilterRule {
	source: String,
	matcher: Matcher,
	redact: bool,
}

impl FilterRule {
	/// Parses a rule. Strings of the form `/body/flags` are regular
	/// expressions; everything else is compared literally and case-sensitively.
	pub fn parse(source: &str, redact: bool) -> Result<Self, RedactError> {
		let matcher = match split_delimited(source) {
			Some((body, flags)) => Matcher::Pattern(compile(source, body, flags)?),
			None => Matcher::Literal(source.to_string()),
		};

		Ok(Self {
			source: source.to_string(),
			matcher,
			redact,
		})
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn redacts(&self) -> bool {
		self.redact
	}

	pub fn is_pattern(&self) -> bool {
		matches!(self.matcher, Matcher::Pattern(_))
	}

	pub fn matches(&self, text: &str) -> bool {
		match &self.matcher {
			Matcher::Literal(literal) => literal == text,
			Matcher::Pattern(regex) => regex.is_match(text),
		}
	}
}

impl fmt::Debug for FilterRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilterRule")
			.field("source", &self.source)
			.field("redact", &self.redact)
			.finish()
	}
}

fn split_delimited(source: &str) -> Option<(&str, &str)> {
	let rest = source.strip_prefix('/')?;
	let end = rest.rfind('/')?;
	Some((&rest[..end], &rest[end + 1..]))
}

fn compile(source: &str, body: &str, flags: &str) -> Result<Regex, RedactError> {
	let mut builder = RegexBuilder::new(body);
	builder.size_limit(REGEX_SIZE_LIMIT);

	for flag in flags.chars() {
		match flag {
			'i' => builder.case_insensitive(true),
			'm' => builder.multi_line(true),
			's' => builder.dot_matches_new_line(true),
			'x' => builder.ignore_whitespace(true),
			'U' => builder.swap_greed(true),
			'u' => builder.unicode(true),
			other => {
				return Err(RedactError::UnsupportedFlag {
					rule: source.to_string(),
					flag: other,
				})
			}
		};
	}

	builder.build().map_err(|e| RedactError::InvalidPattern {
		rule: source.to_string(),
		source: e,
	})
}

/// An ordered collection of [`FilterRule`]s.
#[derive(Debug, Clone, Default)]
pub struct FilterRuleSet {
	rules: Vec<FilterRule>,
}

impl FilterRuleSet {
	pub fn new() -> Self {
		Self { rules: Vec::new() }
	}

	/// Builds a rule set from `pattern -> redact` pairs.
	pub fn from_pairs<I, S>(pairs: I) -> Result<Self, RedactError>
	where
		I: IntoIterator<Item = (S, bool)>,
		S: AsRef<str>,
	{
		let rules = pairs
			.into_iter()
			.map(|(source, redact)| FilterRule::parse(source.as_ref(), redact))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { rules })
	}

	/// The rules shipped by default, all set to redact.
	pub fn defaults() -> Self {
		Self::from_pairs(DEFAULT_RULES.iter().map(|r| (*r, true)))
			.expect("default filter rules are valid")
	}

	pub fn push(&mut self, rule: FilterRule) {
		self.rules.push(rule);
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &FilterRule> {
		self.rules.iter()
	}

	/// Returns true if any redacting rule matches `text`.
	pub fn is_sensitive(&self, text: &str) -> bool {
		self.rules.iter().any(|rule| rule.redacts() && rule.matches(text))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slash_delimited_source_is_a_pattern() {
		let rule = FilterRule::parse("/TOKEN/i", true).unwrap();
		assert!(rule.is_pattern());
		assert!(rule.matches("api_token"));
		assert!(rule.matches("X-TOKEN"));
	}

	#[test]
	fn pattern_without_flag_is_case_sensitive() {
		let rule = FilterRule::parse("/HTTP_COOKIE/", true).unwrap();
		assert!(rule.matches("HTTP_COOKIE"));
		assert!(!rule.matches("http_cookie"));
	}

	#[test]
	fn literal_requires_exact_match() {
		let rule = FilterRule::parse("Cookie", true).unwrap();
		assert!(!rule.is_pattern());
		assert!(rule.matches("Cookie"));
		assert!(!rule.matches("cookie"));
		assert!(!rule.matches("Set-Cookie"));
	}

	#[test]
	fn single_slash_is_literal() {
		let rule = FilterRule::parse("/", true).unwrap();
		assert!(!rule.is_pattern());
		assert!(rule.matches("/"));
	}

	#[test]
	fn unknown_flag_is_rejected() {
		let err = FilterRule::parse("/KEY/q", true).unwrap_err();
		assert!(matches!(err, RedactError::UnsupportedFlag { flag: 'q', .. }));
	}

	#[test]
	fn invalid_pattern_is_rejected() {
		let err = FilterRule::parse("/(/", true).unwrap_err();
		assert!(matches!(err, RedactError::InvalidPattern { .. }));
	}

	#[test]
	fn disabled_rule_does_not_mark_sensitive() {
		let rules = FilterRuleSet::from_pairs([("password", false)]).unwrap();
		assert!(!rules.is_sensitive("password"));
	}

	#[test]
	fn defaults_cover_common_secrets() {
		let rules = FilterRuleSet::defaults();
		assert_eq!(rules.len(), DEFAULT_RULES.len());
		for name in ["db_password", "API_KEY", "session_token", "client_secret", "Cookie", "Authorization"] {
			assert!(rules.is_sensitive(name), "{name} should be sensitive");
		}
		assert!(!rules.is_sensitive("username"));
	}
}
