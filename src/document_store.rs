//! Document store: metadata collection, per-document content, attachment blobs.

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::app_response::AppResponse;
use crate::archive_model::require;
use crate::blob_store::{parse_data_url, to_data_url, BlobStore};
use crate::document_model::{
    normalize_barcode, Attachment, AttachmentData, AttachmentUpload, DocumentContent,
    DocumentMetadata, DocumentScope, DocumentUpdate, FullDocument, NewDocument,
};
use crate::key_value_store::{
    load_or_default, read_json, write_json, SharedStore, CONTENT_KEY_PREFIX, DOCUMENTS_KEY,
};
use crate::permission::{authorize, Permission};
use crate::user_model::User;

pub struct DocumentStore {
    storage: SharedStore,
    blobs: BlobStore,
    documents: Vec<DocumentMetadata>,
}

impl DocumentStore {
    pub fn load(storage: SharedStore) -> Result<Self, AppResponse> {
        let documents = load_or_default(storage.as_ref(), DOCUMENTS_KEY, Vec::new)?;
        info!("Loaded {} documents", documents.len());
        Ok(Self {
            blobs: BlobStore::new(storage.clone()),
            storage,
            documents,
        })
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn list(&self, actor: Option<&User>) -> Result<Vec<DocumentMetadata>, AppResponse> {
        authorize(actor, Permission::ReadDocument)?;
        Ok(self.documents.clone())
    }

    pub fn list_by_case(
        &self,
        actor: Option<&User>,
        fund_id: &str,
        inventory_id: &str,
        case_id: &str,
    ) -> Result<Vec<DocumentMetadata>, AppResponse> {
        authorize(actor, Permission::ReadDocument)?;
        let scope = DocumentScope::Case(fund_id, inventory_id, case_id);
        Ok(self
            .documents
            .iter()
            .filter(|d| scope.contains(d))
            .cloned()
            .collect())
    }

    pub fn get(&self, actor: Option<&User>, id: &str) -> Result<FullDocument, AppResponse> {
        authorize(actor, Permission::ReadDocument)?;
        let metadata = self
            .metadata(id)
            .cloned()
            .ok_or_else(|| AppResponse::not_found("Document", id))?;
        let content = self.load_content(id)?;
        Ok(FullDocument { metadata, content })
    }

    /// Case-insensitive substring search over title, description and content text.
    pub fn search(
        &self,
        actor: Option<&User>,
        query: &str,
    ) -> Result<Vec<DocumentMetadata>, AppResponse> {
        authorize(actor, Permission::ReadDocument)?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for doc in &self.documents {
            let matches = doc.title.to_lowercase().contains(&needle)
                || doc.description.to_lowercase().contains(&needle)
                || self.load_content(&doc.id)?.text.to_lowercase().contains(&needle);
            if matches {
                hits.push(doc.clone());
            }
        }
        Ok(hits)
    }

    /// Every document whose stored barcode equals `barcode` exactly.
    pub fn search_by_barcode(
        &self,
        actor: Option<&User>,
        barcode: &str,
    ) -> Result<Vec<DocumentMetadata>, AppResponse> {
        authorize(actor, Permission::ReadDocument)?;
        let wanted = barcode.trim();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for doc in &self.documents {
            if self.load_content(&doc.id)?.barcode.as_deref() == Some(wanted) {
                hits.push(doc.clone());
            }
        }
        Ok(hits)
    }

    pub fn attachment(
        &self,
        actor: Option<&User>,
        document_id: &str,
        blob_id: &str,
    ) -> Result<AttachmentData, AppResponse> {
        let document = self.get(actor, document_id)?;
        let attachment = document
            .content
            .attachments
            .iter()
            .find(|a| a.blob_id == blob_id)
            .ok_or_else(|| AppResponse::not_found("Attachment", blob_id))?;
        let bytes = self
            .blobs
            .get(blob_id)?
            .ok_or_else(|| AppResponse::not_found("Attachment blob", blob_id))?;
        Ok(AttachmentData {
            mime_type: attachment.mime_type.clone(),
            data_url: to_data_url(&attachment.mime_type, &bytes),
        })
    }

    /// Files a new document. `case_exists` resolves the fund/inventory/case path
    /// against the entity tree.
    pub fn create<F>(
        &mut self,
        actor: Option<&User>,
        new: NewDocument,
        case_exists: F,
    ) -> Result<String, AppResponse>
    where
        F: Fn(&str, &str, &str) -> bool,
    {
        authorize(actor, Permission::CreateDocument)?;
        require("title", &new.title)?;
        require("description", &new.description)?;
        require("text", &new.text)?;
        require("fundId", &new.fund_id)?;
        require("inventoryId", &new.inventory_id)?;
        require("caseId", &new.case_id)?;
        if !case_exists(&new.fund_id, &new.inventory_id, &new.case_id) {
            return Err(AppResponse::NotFound(format!(
                "Case {}/{}/{} does not exist",
                new.fund_id, new.inventory_id, new.case_id
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let attachments = self.store_uploads(new.attachments)?;
        let content = DocumentContent {
            text: new.text,
            attachments,
            barcode: normalize_barcode(new.barcode),
        };
        let metadata = DocumentMetadata {
            id: id.clone(),
            title: new.title,
            description: new.description,
            fund_id: new.fund_id,
            inventory_id: new.inventory_id,
            case_id: new.case_id,
            created_at: now,
            updated_at: now,
            created_by: actor.map(|u| u.id.clone()).unwrap_or_default(),
        };

        if let Err(e) = write_json(self.storage.as_ref(), &content_key(&id), &content) {
            self.release_all(&content.attachments);
            return Err(e);
        }
        let mut documents = self.documents.clone();
        documents.push(metadata);
        if let Err(e) = self.commit(documents) {
            let _ = self.storage.remove(&content_key(&id));
            self.release_all(&content.attachments);
            return Err(e);
        }

        info!("Document {id} created");
        Ok(id)
    }

    pub fn update(
        &mut self,
        actor: Option<&User>,
        id: &str,
        update: DocumentUpdate,
    ) -> Result<FullDocument, AppResponse> {
        authorize(actor, Permission::EditDocument)?;
        let index = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| AppResponse::not_found("Document", id))?;
        if let Some(title) = &update.title {
            require("title", title)?;
        }
        if let Some(description) = &update.description {
            require("description", description)?;
        }
        if let Some(text) = &update.text {
            require("text", text)?;
        }

        let previous = self.load_content(id)?;
        let mut content = previous.clone();
        let (kept, dropped): (Vec<Attachment>, Vec<Attachment>) = match &update.keep_attachments {
            Some(keep) => content
                .attachments
                .drain(..)
                .partition(|a| keep.contains(&a.blob_id)),
            None => (std::mem::take(&mut content.attachments), Vec::new()),
        };
        let added = self.store_uploads(update.add_attachments)?;
        content.attachments = kept;
        content.attachments.extend(added.iter().cloned());
        if let Some(text) = update.text {
            content.text = text;
        }
        if update.barcode.is_some() {
            content.barcode = normalize_barcode(update.barcode);
        }

        let mut documents = self.documents.clone();
        let metadata = &mut documents[index];
        if let Some(title) = update.title {
            metadata.title = title;
        }
        if let Some(description) = update.description {
            metadata.description = description;
        }
        metadata.updated_at = Utc::now().max(metadata.updated_at);
        let metadata = metadata.clone();

        if let Err(e) = write_json(self.storage.as_ref(), &content_key(id), &content) {
            self.release_all(&added);
            return Err(e);
        }
        if let Err(e) = self.commit(documents) {
            if let Err(restore) = write_json(self.storage.as_ref(), &content_key(id), &previous) {
                warn!("Failed to restore content of document {id}: {restore}");
            }
            self.release_all(&added);
            return Err(e);
        }
        self.release_all(&dropped);

        debug!("Document {id} updated");
        Ok(FullDocument { metadata, content })
    }

    pub fn delete(&mut self, actor: Option<&User>, id: &str) -> Result<DocumentMetadata, AppResponse> {
        authorize(actor, Permission::DeleteDocument)?;
        if self.metadata(id).is_none() {
            return Err(AppResponse::not_found("Document", id));
        }
        let mut removed = self.remove_where(|d| d.id == id)?;
        info!("Document {id} deleted");
        removed
            .pop()
            .ok_or_else(|| AppResponse::not_found("Document", id))
    }

    /// Removes every document under `scope`. Callers authorize the deletion of the
    /// parent node; this is its cascade.
    pub fn purge(&mut self, scope: DocumentScope<'_>) -> Result<usize, AppResponse> {
        let removed = self.remove_where(|d| scope.contains(d))?;
        if !removed.is_empty() {
            info!("Purged {} documents under {:?}", removed.len(), scope);
        }
        Ok(removed.len())
    }

    fn metadata(&self, id: &str) -> Option<&DocumentMetadata> {
        self.documents.iter().find(|d| d.id == id)
    }

    fn remove_where<F>(&mut self, predicate: F) -> Result<Vec<DocumentMetadata>, AppResponse>
    where
        F: Fn(&DocumentMetadata) -> bool,
    {
        let (removed, remaining): (Vec<_>, Vec<_>) =
            self.documents.iter().cloned().partition(|d| predicate(d));
        if removed.is_empty() {
            return Ok(removed);
        }

        let contents: Vec<DocumentContent> = removed
            .iter()
            .map(|d| self.load_content(&d.id).unwrap_or_default())
            .collect();
        self.commit(remaining)?;

        for (doc, content) in removed.iter().zip(contents) {
            if let Err(e) = self.storage.remove(&content_key(&doc.id)) {
                warn!("Failed to remove content of document {}: {e}", doc.id);
            }
            self.release_all(&content.attachments);
        }
        Ok(removed)
    }

    fn store_uploads(&self, uploads: Vec<AttachmentUpload>) -> Result<Vec<Attachment>, AppResponse> {
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.store_upload(upload) {
                Ok(attachment) => stored.push(attachment),
                Err(e) => {
                    self.release_all(&stored);
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    fn store_upload(&self, upload: AttachmentUpload) -> Result<Attachment, AppResponse> {
        require("fileName", &upload.file_name)?;
        let (url_mime, bytes) = parse_data_url(&upload.data_url)?;
        let blob_id = self.blobs.put(&bytes)?;
        Ok(Attachment {
            name: upload.name.unwrap_or_else(|| upload.file_name.clone()),
            file_name: upload.file_name,
            mime_type: upload.mime_type.filter(|m| !m.trim().is_empty()).unwrap_or(url_mime),
            size: bytes.len() as u64,
            blob_id,
        })
    }

    fn release_all(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(e) = self.blobs.release(&attachment.blob_id) {
                warn!("Failed to release blob {}: {e}", attachment.blob_id);
            }
        }
    }

    fn load_content(&self, id: &str) -> Result<DocumentContent, AppResponse> {
        match read_json::<DocumentContent>(self.storage.as_ref(), &content_key(id)) {
            Ok(Some(content)) => Ok(content),
            Ok(None) => {
                warn!("Document {id} has no stored content");
                Ok(DocumentContent::default())
            }
            Err(AppResponse::SerializationError(msg)) => {
                warn!("Content of document {id} is corrupt: {msg}");
                Ok(DocumentContent::default())
            }
            Err(e) => Err(e),
        }
    }

    fn commit(&mut self, documents: Vec<DocumentMetadata>) -> Result<(), AppResponse> {
        write_json(self.storage.as_ref(), DOCUMENTS_KEY, &documents)?;
        debug!("Document metadata persisted ({} documents)", documents.len());
        self.documents = documents;
        Ok(())
    }
}

fn content_key(id: &str) -> String {
    format!("{CONTENT_KEY_PREFIX}{id}")
}
