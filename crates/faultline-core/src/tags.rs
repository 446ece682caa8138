// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tags and custom data attached to a report.

use serde::{Deserialize, Serialize};

/// Free-form diagnostic context keyed by name.
pub type CustomData = serde_json::Map<String, serde_json::Value>;

/// Ordered set of short labels. Insertion order is kept and duplicates are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
	pub fn new() -> Self {
		Self(Vec::new())
	}

	/// Adds a tag. Returns false if it was already present.
	pub fn insert(&mut self, tag: impl Into<String>) -> bool {
		let tag = tag.into();
		if self.contains(&tag) {
			return false;
		}
		self.0.push(tag);
		true
	}

	pub fn remove(&mut self, tag: &str) -> bool {
		let before = self.0.len();
		self.0.retain(|t| t != tag);
		self.0.len() != before
	}

	pub fn contains(&self, tag: &str) -> bool {
		self.0.iter().any(|t| t == tag)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	pub fn into_vec(self) -> Vec<String> {
		self.0
	}
}

impl<S: Into<String>> FromIterator<S> for TagSet {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		let mut set = TagSet::new();
		for tag in iter {
			set.insert(tag);
		}
		set
	}
}

impl<S: Into<String>> Extend<S> for TagSet {
	fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
		for tag in iter {
			self.insert(tag);
		}
	}
}

impl From<Vec<String>> for TagSet {
	fn from(tags: Vec<String>) -> Self {
		tags.into_iter().collect()
	}
}
