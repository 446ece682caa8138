// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;

/// Identity attached to reports when user tracking is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
	pub email: String,
}

impl UserIdentity {
	pub fn new(email: impl Into<String>) -> Self {
		Self {
			email: email.into(),
		}
	}
}

/// Supplies the currently authenticated user, if any.
pub trait UserProvider: Send + Sync {
	fn current_user(&self) -> Option<UserIdentity>;
}

impl<F> UserProvider for F
where
	F: Fn() -> Option<UserIdentity> + Send + Sync,
{
	fn current_user(&self) -> Option<UserIdentity> {
		self()
	}
}
