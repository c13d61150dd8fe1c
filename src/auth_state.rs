//! User directory and the current login.
//!
//! There are no tokens. The current user is whoever last logged in. It is kept in
//! memory and mirrored under [`CURRENT_USER_KEY`] so a reopened archive resumes it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use log::{info, warn};
use uuid::Uuid;

use crate::app_response::AppResponse;
use crate::archive_model::require;
use crate::key_value_store::{
    load_or_default, read_json, write_json, SharedStore, CURRENT_USER_KEY, USERS_KEY,
};
use crate::permission::{authorize, has_permission, Permission};
use crate::user_model::{LoginRequest, NewUser, RegisterRequest, StoredUser, User, UserRole};

pub struct AuthService {
    storage: SharedStore,
    users: Vec<StoredUser>,
    current: Option<User>,
}

impl AuthService {
    pub fn load(storage: SharedStore) -> Result<Self, AppResponse> {
        let users: Vec<StoredUser> = load_or_default(storage.as_ref(), USERS_KEY, Vec::new)?;
        let mirrored = match read_json::<User>(storage.as_ref(), CURRENT_USER_KEY) {
            Ok(user) => user,
            Err(AppResponse::SerializationError(msg)) => {
                warn!("Stored session is corrupt, ignoring it: {msg}");
                None
            }
            Err(e) => return Err(e),
        };

        let mut service = Self {
            storage,
            users,
            current: None,
        };
        if let Some(user) = mirrored {
            match service.find(&user.id) {
                Some(stored) => {
                    info!("Resumed session of {}", stored.user.id);
                    service.current = Some(stored.user.clone());
                }
                None => warn!("Session user {} no longer exists", user.id),
            }
            service.mirror_session()?;
        }
        Ok(service)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        has_permission(self.current.as_ref().map(|u| u.role), permission)
    }

    /// Self-service sign-up. The very first account becomes the owner, later ones
    /// start as readers.
    pub fn register(&mut self, request: RegisterRequest) -> Result<User, AppResponse> {
        let role = if self.users.is_empty() {
            UserRole::Owner
        } else {
            UserRole::Reader
        };
        let user = self.insert_user(NewUser {
            name: request.name,
            email: request.email,
            password: request.password,
            role,
        })?;
        info!("Registered user {} as {}", user.id, user.role);
        Ok(user)
    }

    pub fn login(&mut self, request: LoginRequest) -> Result<User, AppResponse> {
        let invalid = || AppResponse::NotFound("Invalid credentials".to_string());
        let stored = self
            .find_by_email(&request.email)
            .ok_or_else(invalid)?;
        let hash = PasswordHash::new(&stored.password_hash)?;
        Argon2::default()
            .verify_password(request.password.as_bytes(), &hash)
            .map_err(|_| invalid())?;

        let user = stored.user.clone();
        self.current = Some(user.clone());
        self.mirror_session()?;
        info!("User {} logged in", user.id);
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<(), AppResponse> {
        if let Some(user) = self.current.take() {
            info!("User {} logged out", user.id);
        }
        self.mirror_session()
    }

    pub fn list_users(&self) -> Result<Vec<User>, AppResponse> {
        authorize(self.current.as_ref(), Permission::ManageUsers)?;
        Ok(self.users.iter().map(|s| s.user.clone()).collect())
    }

    pub fn create_user(&mut self, new: NewUser) -> Result<User, AppResponse> {
        authorize(self.current.as_ref(), Permission::ManageUsers)?;
        if new.role == UserRole::Owner {
            authorize(self.current.as_ref(), Permission::AssignOwnerRole)?;
        }
        let user = self.insert_user(new)?;
        info!("Created user {} as {}", user.id, user.role);
        Ok(user)
    }

    pub fn update_user_role(&mut self, user_id: &str, role: UserRole) -> Result<User, AppResponse> {
        authorize(self.current.as_ref(), Permission::ManageUsers)?;
        let existing = self
            .find(user_id)
            .map(|s| s.user.role)
            .ok_or_else(|| AppResponse::not_found("User", user_id))?;
        if is_privileged(existing) || role == UserRole::Owner {
            authorize(self.current.as_ref(), Permission::AssignOwnerRole)?;
        }
        if existing == UserRole::Owner && role != UserRole::Owner && self.owner_count() == 1 {
            return Err(AppResponse::ValidationError(
                "Cannot demote the last owner".to_string(),
            ));
        }

        let mut users = self.users.clone();
        let mut updated = None;
        for stored in users.iter_mut().filter(|s| s.user.id == user_id) {
            stored.user.role = role;
            updated = Some(stored.user.clone());
        }
        let updated = updated.ok_or_else(|| AppResponse::not_found("User", user_id))?;
        self.commit(users)?;

        if self.current.as_ref().is_some_and(|u| u.id == user_id) {
            self.current = Some(updated.clone());
            self.mirror_session()?;
        }
        info!("User {user_id} is now {role}");
        Ok(updated)
    }

    pub fn delete_user(&mut self, user_id: &str) -> Result<User, AppResponse> {
        authorize(self.current.as_ref(), Permission::ManageUsers)?;
        let target = self
            .find(user_id)
            .map(|s| s.user.clone())
            .ok_or_else(|| AppResponse::not_found("User", user_id))?;
        if self.current.as_ref().is_some_and(|u| u.id == user_id) {
            return Err(AppResponse::ValidationError(
                "Cannot delete your own account".to_string(),
            ));
        }
        if is_privileged(target.role) {
            authorize(self.current.as_ref(), Permission::AssignOwnerRole)?;
        }
        if target.role == UserRole::Owner && self.owner_count() == 1 {
            return Err(AppResponse::ValidationError(
                "Cannot delete the last owner".to_string(),
            ));
        }

        let users: Vec<StoredUser> = self
            .users
            .iter()
            .filter(|s| s.user.id != user_id)
            .cloned()
            .collect();
        self.commit(users)?;

        info!("User {user_id} deleted");
        Ok(target)
    }

    fn insert_user(&mut self, new: NewUser) -> Result<User, AppResponse> {
        require("name", &new.name)?;
        require("email", &new.email)?;
        require("password", &new.password)?;
        let email = new.email.trim().to_string();
        if self.find_by_email(&email).is_some() {
            return Err(AppResponse::ValidationError(format!(
                "A user with email {email} already exists"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(new.password.as_bytes(), &salt)?
            .to_string();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email,
            role: new.role,
        };

        let mut users = self.users.clone();
        users.push(StoredUser {
            user: user.clone(),
            password_hash,
        });
        self.commit(users)?;
        Ok(user)
    }

    fn find(&self, user_id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|s| s.user.id == user_id)
    }

    fn find_by_email(&self, email: &str) -> Option<&StoredUser> {
        let email = email.trim();
        self.users
            .iter()
            .find(|s| s.user.email.eq_ignore_ascii_case(email))
    }

    fn owner_count(&self) -> usize {
        self.users
            .iter()
            .filter(|s| s.user.role == UserRole::Owner)
            .count()
    }

    fn mirror_session(&self) -> Result<(), AppResponse> {
        match &self.current {
            Some(user) => write_json(self.storage.as_ref(), CURRENT_USER_KEY, user),
            None => self.storage.remove(CURRENT_USER_KEY).map(|_| ()),
        }
    }

    fn commit(&mut self, users: Vec<StoredUser>) -> Result<(), AppResponse> {
        write_json(self.storage.as_ref(), USERS_KEY, &users)?;
        self.users = users;
        Ok(())
    }
}

/// Admin and owner accounts can only be changed or removed by an owner.
fn is_privileged(role: UserRole) -> bool {
    matches!(role, UserRole::Owner | UserRole::Admin)
}
