use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::DomainError;

/// Authorization category assigned to a user.
///
/// Exactly one role is held by a user at any time. The set is closed: stored
/// values outside it are rejected rather than mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Ordinary community member
    Member,
    /// Religious leader managing a masjid
    Imam,
    /// Platform administrator
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Member, Role::Imam, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Imam => "imam",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    /// Accepts the canonical names plus the spellings written by the
    /// registration flows (`administrator`, `religious-leader`, `organization-manager`, ...).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "member" | "user" | "ordinary member" | "ordinary-member" => Ok(Role::Member),
            "imam" | "religious-leader" | "religious_leader" | "religious leader"
            | "organization-manager" | "organization_manager" | "organization manager" => {
                Ok(Role::Imam)
            }
            "admin" | "administrator" => Ok(Role::Admin),
            _ => Err(DomainError::UnrecognizedRole(value.to_string())),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
