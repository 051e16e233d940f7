//! Domain models for the customer identity service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse-grained authority carried by every customer and every token.
///
/// Serialized as `"USER"` / `"ADMIN"`. The older `ROLE_`-prefixed spellings
/// are still accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    #[serde(alias = "ROLE_USER")]
    User,
    #[serde(alias = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// All roles, lowest authority first
    pub fn all() -> [Role; 2] {
        [Role::User, Role::Admin]
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
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Who a request is acting as: the token subject and its single role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}
