//! Document records.
//!
//! Metadata for every document lives in one collection. Content (text, barcode,
//! attachment references) is stored per document under its own key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub fund_id: String,
    pub inventory_id: String,
    pub case_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Id of the user who created the document.
    pub created_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

/// Reference to a stored blob plus the file details shown in the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub blob_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullDocument {
    pub metadata: DocumentMetadata,
    pub content: DocumentContent,
}

/// A file picked in the UI, still encoded as a data URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUpload {
    pub file_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Overrides the MIME type carried by the data URL.
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    pub data_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub fund_id: String,
    pub inventory_id: String,
    pub case_id: String,
    pub text: String,
    pub attachments: Vec<AttachmentUpload>,
    pub barcode: Option<String>,
}

/// Partial update. `barcode: Some("")` clears the barcode.
/// `keep_attachments` lists blob ids to keep; `None` keeps all of them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub text: Option<String>,
    pub barcode: Option<String>,
    pub keep_attachments: Option<Vec<String>>,
    pub add_attachments: Vec<AttachmentUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentData {
    pub mime_type: String,
    pub data_url: String,
}

/// Subtree whose documents are purged when a fund, inventory or case is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentScope<'a> {
    Fund(&'a str),
    Inventory(&'a str, &'a str),
    Case(&'a str, &'a str, &'a str),
}

impl DocumentScope<'_> {
    pub fn contains(&self, doc: &DocumentMetadata) -> bool {
        match *self {
            DocumentScope::Fund(f) => doc.fund_id == f,
            DocumentScope::Inventory(f, i) => doc.fund_id == f && doc.inventory_id == i,
            DocumentScope::Case(f, i, c) => {
                doc.fund_id == f && doc.inventory_id == i && doc.case_id == c
            }
        }
    }
}

pub(crate) fn normalize_barcode(barcode: Option<String>) -> Option<String> {
    barcode
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
}
