//! Role-based policy.
//!
//! Every gated action consults [`evaluate`] exactly once. The answer depends only on
//! the role and the permission, never on the entity being touched.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::user_model::{User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    CreateDocument,
    EditDocument,
    DeleteDocument,
    ReadDocument,
    ManageUsers,
    /// Granting or revoking the owner role.
    AssignOwnerRole,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::CreateDocument,
        Permission::EditDocument,
        Permission::DeleteDocument,
        Permission::ReadDocument,
        Permission::ManageUsers,
        Permission::AssignOwnerRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateDocument => "createDocument",
            Permission::EditDocument => "editDocument",
            Permission::DeleteDocument => "deleteDocument",
            Permission::ReadDocument => "readDocument",
            Permission::ManageUsers => "manageUsers",
            Permission::AssignOwnerRole => "assignOwnerRole",
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = AppResponse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| AppResponse::ValidationError(format!("Unknown permission: {s}")))
    }
}

const OWNER: &[Permission] = &Permission::ALL;

const ADMIN: &[Permission] = &[
    Permission::CreateDocument,
    Permission::EditDocument,
    Permission::DeleteDocument,
    Permission::ReadDocument,
    Permission::ManageUsers,
];

const ARCHIVIST: &[Permission] = &[
    Permission::EditDocument,
    Permission::DeleteDocument,
    Permission::ReadDocument,
];

const READER: &[Permission] = &[Permission::ReadDocument];

const POLICY: [(UserRole, &[Permission]); 4] = [
    (UserRole::Owner, OWNER),
    (UserRole::Admin, ADMIN),
    (UserRole::Archivist, ARCHIVIST),
    (UserRole::Reader, READER),
];

pub fn allowed_permissions(role: UserRole) -> &'static [Permission] {
    POLICY
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, permissions)| *permissions)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum PolicyDecision {
    Allowed,
    Denied {
        role: Option<UserRole>,
        permission: Permission,
    },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allowed)
    }

    pub fn into_result(self) -> Result<(), AppResponse> {
        match self {
            PolicyDecision::Allowed => Ok(()),
            PolicyDecision::Denied { role: Some(role), permission } => Err(
                AppResponse::PermissionDenied(format!("role '{role}' lacks '{}'", permission.as_str())),
            ),
            PolicyDecision::Denied { role: None, permission } => Err(AppResponse::PermissionDenied(
                format!("login required for '{}'", permission.as_str()),
            )),
        }
    }
}

/// `None` means nobody is logged in, which is denied everything.
pub fn evaluate(role: Option<UserRole>, permission: Permission) -> PolicyDecision {
    match role {
        Some(r) if allowed_permissions(r).contains(&permission) => PolicyDecision::Allowed,
        _ => PolicyDecision::Denied { role, permission },
    }
}

pub fn has_permission(role: Option<UserRole>, permission: Permission) -> bool {
    evaluate(role, permission).is_allowed()
}

pub fn authorize(actor: Option<&User>, permission: Permission) -> Result<(), AppResponse> {
    let decision = evaluate(actor.map(|u| u.role), permission);
    if !decision.is_allowed() {
        warn!(
            "Denied '{}' for {}",
            permission.as_str(),
            actor.map(|u| u.id.as_str()).unwrap_or("anonymous")
        );
    }
    decision.into_result()
}
