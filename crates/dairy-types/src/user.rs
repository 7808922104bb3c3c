//! User and identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user acts under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
	Admin,
	Customer,
	Delivery,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Admin => "Admin",
			Role::Customer => "Customer",
			Role::Delivery => "Delivery",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"admin" => Ok(Role::Admin),
			"customer" => Ok(Role::Customer),
			"delivery" => Ok(Role::Delivery),
			_ => Err(format!("unknown role '{}'", s)),
		}
	}
}

/// The authenticated caller of an operation.
///
/// Supplied by the identity collaborator; the core never authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub id: String,
	pub role: Role,
}

impl Actor {
	pub fn new(id: impl Into<String>, role: Role) -> Self {
		Self {
			id: id.into(),
			role,
		}
	}

	pub fn admin(id: impl Into<String>) -> Self {
		Self::new(id, Role::Admin)
	}

	pub fn customer(id: impl Into<String>) -> Self {
		Self::new(id, Role::Customer)
	}

	pub fn delivery(id: impl Into<String>) -> Self {
		Self::new(id, Role::Delivery)
	}
}

/// A registered user of any role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub username: String,
	pub role: Role,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub address: Option<String>,
	/// Inactive delivery personnel cannot receive new assignments.
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
}

/// Payload for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
	pub username: String,
	pub role: Role,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub address: Option<String>,
}

impl NewUser {
	pub fn new(username: impl Into<String>, role: Role) -> Self {
		Self {
			username: username.into(),
			role,
			phone: None,
			address: None,
		}
	}
}

/// Partial update for a user. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
	pub username: Option<String>,
	pub role: Option<Role>,
	pub phone: Option<String>,
	pub address: Option<String>,
	pub is_active: Option<bool>,
}
