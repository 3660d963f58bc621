//! Supporting documents (receipts, payment proof). Upload and format
//! validation happen upstream; this module only keeps the records.

use super::domain::{Document, DocumentId, DocumentStatus, LeaseId};
use super::repository::{LedgerStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct DocumentDesk<S> {
    store: Arc<S>,
}

impl<S> DocumentDesk<S>
where
    S: LedgerStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register an uploaded document, unverified until a landlord checks it.
    pub fn attach(
        &self,
        title: String,
        lease: Option<LeaseId>,
        storage_key: String,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Document, StoreError> {
        if let Some(lease_id) = &lease {
            if self.store.lease(lease_id)?.is_none() {
                return Err(StoreError::NotFound);
            }
        }
        self.store
            .insert_document(Document::new(title, lease, storage_key, uploaded_at))
    }

    pub fn verify(&self, id: &DocumentId) -> Result<Document, StoreError> {
        let mut document = self.store.document(id)?.ok_or(StoreError::NotFound)?;
        document.status = DocumentStatus::Verified;
        self.store.update_document(document.clone())?;
        Ok(document)
    }

    pub fn for_lease(&self, lease: &LeaseId) -> Result<Vec<Document>, StoreError> {
        self.store.documents_for_lease(lease)
    }
}
