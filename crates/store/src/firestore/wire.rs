//! Request and response bodies of the Firestore REST API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::{WireValue, decode_fields};
use crate::document::{Document, Revision};
use crate::error::StoreError;

/// A document as returned by `get`, `list`, `createDocument` and `patch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl WireDocument {
    /// Convert to a [`Document`], taking the id from the last name segment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] when a field value is malformed.
    pub fn into_document(self) -> Result<Document, StoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        let fields = decode_fields(self.fields).map_err(|e| StoreError::decode(&id, e))?;
        Ok(Document {
            id,
            fields,
            revision: Revision::new(self.update_time.unwrap_or_default()),
        })
    }
}

/// Response of `documents.list`. Both fields are absent for an empty page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(default)]
    pub documents: Vec<WireDocument>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of `createDocument` and `patch`.
#[derive(Debug, Serialize)]
pub struct DocumentBody {
    pub fields: BTreeMap<String, WireValue>,
}

/// Body of `documents:commit`.
#[derive(Debug, Serialize)]
pub struct CommitRequest {
    pub writes: Vec<WireWrite>,
}

/// One write in a commit. Exactly one of `update` or `delete` is set.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<NamedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<WirePrecondition>,
}

#[derive(Debug, Serialize)]
pub struct NamedDocument {
    pub name: String,
    pub fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePrecondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    /// Canonical status such as `FAILED_PRECONDITION` or `NOT_FOUND`.
    #[serde(default)]
    pub status: String,
}
