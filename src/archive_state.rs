//! The archive as a UI host sees it.
//!
//! [`ArchiveState`] owns the shared storage and the three stores. It forwards every
//! action with the logged-in user as the actor. It also keeps documents consistent
//! with the tree: new documents must point at an existing case, and deleting a fund,
//! inventory or case purges the documents filed under it.

use std::sync::Arc;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::archive_model::{
    Case, CaseHit, CaseUpdate, Fund, FundUpdate, Inventory, InventoryUpdate, NewCase, NewFund,
    NewInventory,
};
use crate::archive_store::ArchiveStore;
use crate::auth_state::AuthService;
use crate::config::ArchiveConfig;
use crate::document_model::{
    AttachmentData, DocumentMetadata, DocumentScope, DocumentUpdate, FullDocument, NewDocument,
};
use crate::document_store::DocumentStore;
use crate::key_value_store::SharedStore;
use crate::local_db_state::AppDbState;
use crate::permission::Permission;
use crate::user_model::{LoginRequest, NewUser, RegisterRequest, User, UserRole};

pub struct ArchiveState {
    config: ArchiveConfig,
    storage: SharedStore,
    auth: AuthService,
    archive: ArchiveStore,
    documents: DocumentStore,
}

impl ArchiveState {
    /// Opens the LMDB-backed archive described by `config`.
    pub fn open(config: ArchiveConfig) -> Result<Self, AppResponse> {
        config.validate()?;
        let db = AppDbState::init(&config.name, config.map_size)?;
        Self::with_storage(Arc::new(db), config)
    }

    pub fn with_storage(storage: SharedStore, config: ArchiveConfig) -> Result<Self, AppResponse> {
        let auth = AuthService::load(storage.clone())?;
        let archive = ArchiveStore::load(storage.clone(), config.seed_sample_data)?;
        let documents = DocumentStore::load(storage.clone())?;
        info!("Archive '{}' ready", config.name);
        Ok(Self {
            config,
            storage,
            auth,
            archive,
            documents,
        })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn storage(&self) -> &SharedStore {
        &self.storage
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    // Session and users

    pub fn register(&mut self, request: RegisterRequest) -> Result<User, AppResponse> {
        self.auth.register(request)
    }

    pub fn login(&mut self, request: LoginRequest) -> Result<User, AppResponse> {
        self.auth.login(request)
    }

    pub fn logout(&mut self) -> Result<(), AppResponse> {
        self.auth.logout()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.auth.current_user()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.auth.has_permission(permission)
    }

    pub fn list_users(&self) -> Result<Vec<User>, AppResponse> {
        self.auth.list_users()
    }

    pub fn create_user(&mut self, new: NewUser) -> Result<User, AppResponse> {
        self.auth.create_user(new)
    }

    pub fn update_user_role(&mut self, user_id: &str, role: UserRole) -> Result<User, AppResponse> {
        self.auth.update_user_role(user_id, role)
    }

    pub fn delete_user(&mut self, user_id: &str) -> Result<User, AppResponse> {
        self.auth.delete_user(user_id)
    }

    // Fund tree

    pub fn funds(&self) -> &[Fund] {
        self.archive.funds()
    }

    pub fn search_cases(&self, query: &str) -> Vec<CaseHit> {
        self.archive.search_cases(query)
    }

    pub fn create_fund(&mut self, new: NewFund) -> Result<String, AppResponse> {
        self.archive.create_fund(self.auth.current_user(), new)
    }

    pub fn update_fund(&mut self, fund_id: &str, update: FundUpdate) -> Result<Fund, AppResponse> {
        self.archive.update_fund(self.auth.current_user(), fund_id, update)
    }

    pub fn delete_fund(&mut self, fund_id: &str) -> Result<Fund, AppResponse> {
        let removed = self.archive.delete_fund(self.auth.current_user(), fund_id)?;
        self.cascade(DocumentScope::Fund(fund_id))?;
        Ok(removed)
    }

    pub fn create_inventory(&mut self, fund_id: &str, new: NewInventory) -> Result<String, AppResponse> {
        self.archive.create_inventory(self.auth.current_user(), fund_id, new)
    }

    pub fn update_inventory(
        &mut self,
        fund_id: &str,
        inventory_id: &str,
        update: InventoryUpdate,
    ) -> Result<Inventory, AppResponse> {
        self.archive
            .update_inventory(self.auth.current_user(), fund_id, inventory_id, update)
    }

    pub fn delete_inventory(&mut self, fund_id: &str, inventory_id: &str) -> Result<Inventory, AppResponse> {
        let removed = self
            .archive
            .delete_inventory(self.auth.current_user(), fund_id, inventory_id)?;
        self.cascade(DocumentScope::Inventory(fund_id, inventory_id))?;
        Ok(removed)
    }

    pub fn create_case(
        &mut self,
        fund_id: &str,
        inventory_id: &str,
        new: NewCase,
    ) -> Result<String, AppResponse> {
        self.archive
            .create_case(self.auth.current_user(), fund_id, inventory_id, new)
    }

    pub fn update_case(
        &mut self,
        fund_id: &str,
        inventory_id: &str,
        case_id: &str,
        update: CaseUpdate,
    ) -> Result<Case, AppResponse> {
        self.archive
            .update_case(self.auth.current_user(), fund_id, inventory_id, case_id, update)
    }

    pub fn delete_case(&mut self, fund_id: &str, inventory_id: &str, case_id: &str) -> Result<Case, AppResponse> {
        let removed = self
            .archive
            .delete_case(self.auth.current_user(), fund_id, inventory_id, case_id)?;
        self.cascade(DocumentScope::Case(fund_id, inventory_id, case_id))?;
        Ok(removed)
    }

    // Documents

    pub fn list_documents(&self) -> Result<Vec<DocumentMetadata>, AppResponse> {
        self.documents.list(self.auth.current_user())
    }

    pub fn case_documents(
        &self,
        fund_id: &str,
        inventory_id: &str,
        case_id: &str,
    ) -> Result<Vec<DocumentMetadata>, AppResponse> {
        self.documents
            .list_by_case(self.auth.current_user(), fund_id, inventory_id, case_id)
    }

    pub fn get_document(&self, id: &str) -> Result<FullDocument, AppResponse> {
        self.documents.get(self.auth.current_user(), id)
    }

    pub fn create_document(&mut self, new: NewDocument) -> Result<String, AppResponse> {
        let archive = &self.archive;
        self.documents.create(self.auth.current_user(), new, |fund_id, inventory_id, case_id| {
            archive.case(fund_id, inventory_id, case_id).is_some()
        })
    }

    pub fn update_document(&mut self, id: &str, update: DocumentUpdate) -> Result<FullDocument, AppResponse> {
        self.documents.update(self.auth.current_user(), id, update)
    }

    pub fn delete_document(&mut self, id: &str) -> Result<DocumentMetadata, AppResponse> {
        self.documents.delete(self.auth.current_user(), id)
    }

    pub fn search_documents(&self, query: &str) -> Result<Vec<DocumentMetadata>, AppResponse> {
        self.documents.search(self.auth.current_user(), query)
    }

    pub fn search_documents_by_barcode(&self, barcode: &str) -> Result<Vec<DocumentMetadata>, AppResponse> {
        self.documents
            .search_by_barcode(self.auth.current_user(), barcode)
    }

    pub fn attachment(&self, document_id: &str, blob_id: &str) -> Result<AttachmentData, AppResponse> {
        self.documents
            .attachment(self.auth.current_user(), document_id, blob_id)
    }

    fn cascade(&mut self, scope: DocumentScope<'_>) -> Result<(), AppResponse> {
        self.documents.purge(scope).map(|_| ()).map_err(|e| {
            warn!("Tree node removed but documents under {scope:?} were not purged: {e}");
            e
        })
    }
}
