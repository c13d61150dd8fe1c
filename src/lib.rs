//! # Archive Core
//!
//! Storage and policy core for an archive-management front-end. Users browse
//! **funds → inventories → cases → documents**, log in with a role, and create, edit
//! or delete entities according to that role. State is persisted in LMDB as
//! JSON-encoded collections under fixed keys.
//!
//! ## Features
//!
//! - **Entity tree store**: nested fund/inventory/case CRUD with cascading deletes
//! - **Central policy table**: one `(role, permission)` lookup per action
//! - **Document store**: metadata, content, barcode and text search
//! - **Content-addressed attachments**: blobs stored once, referenced by SHA-256
//! - **Local accounts**: Argon2 password hashes, persisted current user
//! - **FFI surface**: every call returns an [`AppResponse`] JSON envelope
//!
//! ## Quick Start
//!
//! ```no_run
//! use archive_core::{create_archive, register_user, create_fund, free_response};
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"name":"city_archive"}"#).unwrap();
//! let state = create_archive(config.as_ptr());
//!
//! let owner = CString::new(r#"{"name":"Ada","email":"ada@example.com","password":"pw"}"#).unwrap();
//! free_response(register_user(state, owner.as_ptr()) as *mut _);
//!
//! let fund = CString::new(r#"{"name":"Archive A","number":"F.9"}"#).unwrap();
//! let response = create_fund(state, fund.as_ptr());
//! free_response(response as *mut _);
//! ```
//!
//! Rust hosts can skip the C layer and drive [`archive_state::ArchiveState`] directly.

pub mod app_response;
pub mod archive_model;
pub mod archive_state;
pub mod archive_store;
pub mod auth_state;
pub mod blob_store;
pub mod config;
pub mod document_model;
pub mod document_store;
pub mod key_value_store;
pub mod local_db_state;
pub mod permission;
pub mod sample_data;
pub mod user_model;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use crate::app_response::AppResponse;
use crate::archive_model::{CaseUpdate, FundUpdate, InventoryUpdate, NewCase, NewFund, NewInventory};
use crate::archive_state::ArchiveState;
use crate::config::ArchiveConfig;
use crate::document_model::{DocumentUpdate, NewDocument};
use crate::permission::Permission;
use crate::user_model::{LoginRequest, NewUser, RegisterRequest, UserRole};

/// Unwraps a `Result<T, *const c_char>`, returning the error envelope early.
macro_rules! ffi_try {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(response) => return response,
        }
    };
}

/// Opens the archive described by a JSON [`ArchiveConfig`].
///
/// # Parameters
///
/// * `config_json` - Null-terminated C string such as `{"name": "city_archive"}`
///
/// # Returns
///
/// Returns a pointer to the [`ArchiveState`] instance on success, or a null pointer on
/// failure. Release it with [`close_archive`].
///
/// # Safety
///
/// This function is unsafe because it dereferences `config_json` without validation.
///
/// # Errors
///
/// Returns null pointer if:
/// - the config pointer is null or not UTF-8
/// - the JSON is malformed or names an empty archive
/// - the LMDB environment cannot be opened
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_archive(config_json: *const c_char) -> *mut ArchiveState {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_archive");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = match ArchiveConfig::from_json(json) {
        Ok(config) => config,
        Err(e) => {
            warn!("Rejected archive config: {e}");
            return std::ptr::null_mut();
        }
    };

    match ArchiveState::open(config) {
        Ok(state) => {
            info!("Archive opened");
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("Failed to open archive: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Drops the archive and its LMDB environment.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]; it must not be used afterwards
///
/// # Returns
///
/// `{"Ok": "Archive closed"}`, or `BadRequest` for a null pointer. The returned string
/// must be freed with [`free_response`].
///
/// # Safety
///
/// Takes ownership of `state`. Passing the same pointer twice is undefined behavior.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_archive(state: *mut ArchiveState) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_archive".to_string());
        return response_to_c_string(&error);
    }

    drop(unsafe { Box::from_raw(state) });
    response_to_c_string(&AppResponse::success("Archive closed"))
}

/// Releases a string returned by any function of this library.
///
/// # Parameters
///
/// * `response` - A string previously returned by this library, or null
///
/// # Returns
///
/// Nothing. Null pointers are ignored.
///
/// # Safety
///
/// `response` must originate from this library and must not be freed twice.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(response: *mut c_char) {
    if !response.is_null() {
        drop(unsafe { CString::from_raw(response) });
    }
}

// Session and users

/// Registers an account. The first account of an archive becomes its owner,
/// later ones start as readers. Registering does not log in.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// On success the `Ok` payload is the created user.
///
/// # JSON Format
///
/// ```json
/// {"name": "Ada", "email": "ada@example.com", "password": "secret"}
/// ```
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn register_user(state: *mut ArchiveState, json_ptr: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "register_user"));
    let request: RegisterRequest = ffi_try!(parse_json(json_ptr));
    respond(state.register(request))
}

/// Logs in and makes the user current for every following call.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `json_ptr` - Null-terminated C string with `{"email", "password"}`
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// Wrong credentials give `NotFound("Invalid credentials")`.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn login(state: *mut ArchiveState, json_ptr: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "login"));
    let request: LoginRequest = ffi_try!(parse_json(json_ptr));
    respond(state.login(request))
}

/// Ends the current session and removes the mirrored session record.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn logout(state: *mut ArchiveState) -> *const c_char {
    let state = ffi_try!(state_mut(state, "logout"));
    respond(state.logout().map(|_| "Logged out"))
}

/// Returns the logged-in user.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// The `Ok` payload is `null` when nobody is logged in.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn current_user(state: *mut ArchiveState) -> *const c_char {
    let state = ffi_try!(state_mut(state, "current_user"));
    respond(Ok(state.current_user()))
}

/// Checks a permission for the logged-in user.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `permission_ptr` - Permission name such as `"editDocument"` or `"manageUsers"`
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// The `Ok` payload is `true` or `false`. Unknown names give `ValidationError`.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn has_permission(state: *mut ArchiveState, permission_ptr: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "has_permission"));
    let name = ffi_try!(c_ptr_to_string(permission_ptr, "permission"));
    respond(
        name.parse::<Permission>()
            .map(|permission| state.has_permission(permission)),
    )
}

/// Lists every account. Requires `manageUsers`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn list_users(state: *mut ArchiveState) -> *const c_char {
    let state = ffi_try!(state_mut(state, "list_users"));
    respond(state.list_users())
}

/// Creates an account with an explicit role. Requires `manageUsers`, and
/// `assignOwnerRole` when the role is `owner`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # JSON Format
///
/// ```json
/// {"name": "Bo", "email": "bo@example.com", "password": "secret", "role": "archivist"}
/// ```
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_user(state: *mut ArchiveState, json_ptr: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "create_user"));
    let new: NewUser = ffi_try!(parse_json(json_ptr));
    respond(state.create_user(new))
}

/// Changes the role of an account. Admin and owner accounts, and granting `owner`,
/// need `assignOwnerRole`. The last owner cannot be demoted.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `user_id` - Null-terminated C string with the account id
/// * `role_ptr` - Role name: `reader`, `archivist`, `admin` or `owner`
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_user_role(
    state: *mut ArchiveState,
    user_id: *const c_char,
    role_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "update_user_role"));
    let user_id = ffi_try!(c_ptr_to_string(user_id, "user id"));
    let role = ffi_try!(c_ptr_to_string(role_ptr, "role"));
    respond(
        role.parse::<UserRole>()
            .and_then(|role| state.update_user_role(&user_id, role)),
    )
}

/// Deletes an account. Admin and owner accounts need `assignOwnerRole`. The
/// current user cannot delete their own account.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `user_id` - Null-terminated C string with the account id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_user(state: *mut ArchiveState, user_id: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "delete_user"));
    let user_id = ffi_try!(c_ptr_to_string(user_id, "user id"));
    respond(state.delete_user(&user_id))
}

// Fund tree

/// Returns the whole fund tree with nested inventories and cases.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_funds(state: *mut ArchiveState) -> *const c_char {
    let state = ffi_try!(state_mut(state, "get_funds"));
    respond(Ok(state.funds()))
}

/// Creates a fund and returns its id. Requires `editDocument`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # JSON Format
///
/// ```json
/// {"name": "Archive A", "number": "F.9", "description": "", "startYear": "1900", "endYear": "1950"}
/// ```
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_fund(state: *mut ArchiveState, json_ptr: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "create_fund"));
    let new: NewFund = ffi_try!(parse_json(json_ptr));
    respond(state.create_fund(new))
}

/// Merges the provided fields into a fund. Omitted fields are left untouched.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// On success the `Ok` payload is the updated fund.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_fund(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "update_fund"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let update: FundUpdate = ffi_try!(parse_json(json_ptr));
    respond(state.update_fund(&fund_id, update))
}

/// Deletes a fund with its inventories, cases and the documents filed under them.
/// Requires `deleteDocument`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_fund(state: *mut ArchiveState, fund_id: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "delete_fund"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    respond(state.delete_fund(&fund_id))
}

/// Creates an inventory under a fund and returns its id.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `json_ptr` - JSON with `title`, `number` and `description`
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// A missing fund gives `NotFound`.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_inventory(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "create_inventory"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let new: NewInventory = ffi_try!(parse_json(json_ptr));
    respond(state.create_inventory(&fund_id, new))
}

/// Merges the provided fields into an inventory.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `inventory_id` - Null-terminated C string with the inventory id
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_inventory(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    inventory_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "update_inventory"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let inventory_id = ffi_try!(c_ptr_to_string(inventory_id, "inventory id"));
    let update: InventoryUpdate = ffi_try!(parse_json(json_ptr));
    respond(state.update_inventory(&fund_id, &inventory_id, update))
}

/// Deletes an inventory with its cases and their documents.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `inventory_id` - Null-terminated C string with the inventory id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_inventory(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    inventory_id: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "delete_inventory"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let inventory_id = ffi_try!(c_ptr_to_string(inventory_id, "inventory id"));
    respond(state.delete_inventory(&fund_id, &inventory_id))
}

/// Creates a case under an inventory and returns its id.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `inventory_id` - Null-terminated C string with the inventory id
/// * `json_ptr` - JSON with `title`, `number`, `year` and `description`
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// A missing fund or inventory gives `NotFound` and leaves the tree untouched.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_case(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    inventory_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "create_case"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let inventory_id = ffi_try!(c_ptr_to_string(inventory_id, "inventory id"));
    let new: NewCase = ffi_try!(parse_json(json_ptr));
    respond(state.create_case(&fund_id, &inventory_id, new))
}

/// Merges the provided fields into a case.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `inventory_id` - Null-terminated C string with the inventory id
/// * `case_id` - Null-terminated C string with the case id
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_case(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    inventory_id: *const c_char,
    case_id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "update_case"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let inventory_id = ffi_try!(c_ptr_to_string(inventory_id, "inventory id"));
    let case_id = ffi_try!(c_ptr_to_string(case_id, "case id"));
    let update: CaseUpdate = ffi_try!(parse_json(json_ptr));
    respond(state.update_case(&fund_id, &inventory_id, &case_id, update))
}

/// Deletes a case and the documents filed under it.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `inventory_id` - Null-terminated C string with the inventory id
/// * `case_id` - Null-terminated C string with the case id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_case(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    inventory_id: *const c_char,
    case_id: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "delete_case"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let inventory_id = ffi_try!(c_ptr_to_string(inventory_id, "inventory id"));
    let case_id = ffi_try!(c_ptr_to_string(case_id, "case id"));
    respond(state.delete_case(&fund_id, &inventory_id, &case_id))
}

/// Case-insensitive search over case titles, used by the dashboard.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `query` - Null-terminated C string with the search text
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// The `Ok` payload is a list of `{fundId, inventoryId, caseId, title}`.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_cases(state: *mut ArchiveState, query: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "search_cases"));
    let query = ffi_try!(c_ptr_to_string(query, "query"));
    respond(Ok(state.search_cases(&query)))
}

// Documents

/// Lists the metadata of every document. Requires `readDocument`.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_documents(state: *mut ArchiveState) -> *const c_char {
    let state = ffi_try!(state_mut(state, "get_documents"));
    respond(state.list_documents())
}

/// Lists the metadata of the documents filed under one case.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `fund_id` - Null-terminated C string with the fund id
/// * `inventory_id` - Null-terminated C string with the inventory id
/// * `case_id` - Null-terminated C string with the case id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_case_documents(
    state: *mut ArchiveState,
    fund_id: *const c_char,
    inventory_id: *const c_char,
    case_id: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "get_case_documents"));
    let fund_id = ffi_try!(c_ptr_to_string(fund_id, "fund id"));
    let inventory_id = ffi_try!(c_ptr_to_string(inventory_id, "inventory id"));
    let case_id = ffi_try!(c_ptr_to_string(case_id, "case id"));
    respond(state.case_documents(&fund_id, &inventory_id, &case_id))
}

/// Returns `{"metadata": ..., "content": ...}` for one document.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `id` - Null-terminated C string with the document id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_document(state: *mut ArchiveState, id: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "get_document"));
    let id = ffi_try!(c_ptr_to_string(id, "document id"));
    respond(state.get_document(&id))
}

/// Creates a document and returns its id. The fund/inventory/case path must exist.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # JSON Format
///
/// ```json
/// {
///   "title": "Charter", "description": "Founding charter", "text": "...",
///   "fundId": "f1", "inventoryId": "i1", "caseId": "c1",
///   "barcode": "12345",
///   "attachments": [{"fileName": "scan.png", "dataUrl": "data:image/png;base64,..."}]
/// }
/// ```
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_document(state: *mut ArchiveState, json_ptr: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "create_document"));
    let new: NewDocument = ffi_try!(parse_json(json_ptr));
    respond(state.create_document(new))
}

/// Applies a partial update to a document. `barcode: ""` clears the barcode and
/// `keepAttachments` lists the blob ids to keep.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `id` - Null-terminated C string with the document id
/// * `json_ptr` - Null-terminated C string containing the JSON payload
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
/// On success the `Ok` payload is the full updated document.
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_document(
    state: *mut ArchiveState,
    id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "update_document"));
    let id = ffi_try!(c_ptr_to_string(id, "document id"));
    let update: DocumentUpdate = ffi_try!(parse_json(json_ptr));
    respond(state.update_document(&id, update))
}

/// Deletes a document, its content and its attachment references.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `id` - Null-terminated C string with the document id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_document(state: *mut ArchiveState, id: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "delete_document"));
    let id = ffi_try!(c_ptr_to_string(id, "document id"));
    respond(state.delete_document(&id))
}

/// Case-insensitive text search over title, description and content.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `query` - Null-terminated C string with the search text
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_documents(state: *mut ArchiveState, query: *const c_char) -> *const c_char {
    let state = ffi_try!(state_mut(state, "search_documents"));
    let query = ffi_try!(c_ptr_to_string(query, "query"));
    respond(state.search_documents(&query))
}

/// Exact barcode lookup. Every document carrying the barcode is returned.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `barcode` - Null-terminated C string with the scanned barcode
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_documents_by_barcode(
    state: *mut ArchiveState,
    barcode: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "search_documents_by_barcode"));
    let barcode = ffi_try!(c_ptr_to_string(barcode, "barcode"));
    respond(state.search_documents_by_barcode(&barcode))
}

/// Returns `{"mimeType", "dataUrl"}` for one attachment of a document.
///
/// # Parameters
///
/// * `state` - Pointer returned by [`create_archive`]
/// * `document_id` - Null-terminated C string with the document id
/// * `blob_id` - Null-terminated C string with the attachment blob id
///
/// # Returns
///
/// Returns a JSON-formatted [`AppResponse`] C string. The returned string must be freed
/// with [`free_response`].
///
/// # Safety
///
/// This function is unsafe because it dereferences raw pointers. `state` must come from
/// [`create_archive`] and string arguments must be valid null-terminated UTF-8.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_attachment(
    state: *mut ArchiveState,
    document_id: *const c_char,
    blob_id: *const c_char,
) -> *const c_char {
    let state = ffi_try!(state_mut(state, "get_attachment"));
    let document_id = ffi_try!(c_ptr_to_string(document_id, "document id"));
    let blob_id = ffi_try!(c_ptr_to_string(blob_id, "blob id"));
    respond(state.attachment(&document_id, &blob_id))
}

/// Serializes a successful value into `{"Ok": "<json>"}`, or the error as-is.
fn respond<T: Serialize>(result: Result<T, AppResponse>) -> *const c_char {
    match result {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => {
                let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
                response_to_c_string(&error)
            }
        },
        Err(e) => response_to_c_string(&e),
    }
}

fn state_mut<'a>(state: *mut ArchiveState, caller: &str) -> Result<&'a mut ArchiveState, *const c_char> {
    match unsafe { state.as_mut() } {
        Some(state) => Ok(state),
        None => {
            warn!("Null state pointer passed to {caller}");
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_json<T: DeserializeOwned>(ptr: *const c_char) -> Result<T, *const c_char> {
    let json = c_ptr_to_string(ptr, "JSON")?;
    serde_json::from_str(&json).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Converts an [`AppResponse`] to a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// # Returns
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - Error envelope for a null pointer or invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
