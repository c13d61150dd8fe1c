use std::fmt::{Display, Formatter};

use argon2::password_hash::Error as PasswordHashError;
use base64::DecodeError;
use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    PermissionDenied(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::NotFound => AppResponse::NotFound("Key not found in LMDB".to_string()),
            LmdbError::MapFull => {
                AppResponse::DatabaseError("LMDB map is full, raise map_size".to_string())
            }
            LmdbError::Corrupted => AppResponse::DatabaseError("Database is corrupted".to_string()),
            _ => AppResponse::DatabaseError(format!("LMDB error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<PasswordHashError> for AppResponse {
    fn from(err: PasswordHashError) -> Self {
        AppResponse::DatabaseError(format!("Password hashing error: {}", err))
    }
}

impl From<DecodeError> for AppResponse {
    fn from(err: DecodeError) -> Self {
        AppResponse::ValidationError(format!("Invalid base64 payload: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        AppResponse::NotFound(format!("{what} not found: {id}"))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AppResponse::PermissionDenied(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppResponse::NotFound(_))
    }
}
