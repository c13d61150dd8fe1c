//! Users and roles.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

/// Access role. Variants are declared lowest privilege first so the derived
/// ordering reads `Owner > Admin > Archivist > Reader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Reader,
    Archivist,
    Admin,
    Owner,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Owner,
        UserRole::Admin,
        UserRole::Archivist,
        UserRole::Reader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Reader => "reader",
            UserRole::Archivist => "archivist",
            UserRole::Admin => "admin",
            UserRole::Owner => "owner",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppResponse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" => Ok(UserRole::Reader),
            "archivist" => Ok(UserRole::Archivist),
            "admin" => Ok(UserRole::Admin),
            "owner" => Ok(UserRole::Owner),
            other => Err(AppResponse::ValidationError(format!("Unknown role: {other}"))),
        }
    }
}

/// The public view of an account, and the value mirrored as the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Persisted account: the user plus its Argon2 PHC hash string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account created from the user-management panel, with an explicit role.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Reader
}
