//! Remote document store contract
//!
//! The store owns ids, timestamps and row-level access: a signed-in user only
//! ever sees their own documents. [`MemoryStore`] models the same rules in
//! process.

use std::cell::{Cell, RefCell};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{DocumentId, DocumentRecord, DocumentSummary, NewDocument};

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }
}

/// Single-threaded in the browser, so no `Send` bounds on the futures
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// `Ok(None)` when nobody is signed in
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError>;

    /// Insert and return the stored row
    async fn create(&self, owner: &Identity, document: NewDocument) -> Result<DocumentRecord, StoreError>;

    /// `Ok(None)` when the row does not exist or is not visible
    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError>;

    /// Visible documents, newest first
    async fn list_recent(&self) -> Result<Vec<DocumentSummary>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    identity: Option<Identity>,
    documents: Vec<DocumentRecord>,
    unavailable: bool,
    failure: Option<String>,
}

/// In-process store with switchable identity and failure injection
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
    create_calls: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        let store = Self::new();
        store.sign_in(identity);
        store
    }

    pub fn sign_in(&self, identity: Identity) {
        self.state.borrow_mut().identity = Some(identity);
    }

    pub fn sign_out(&self) {
        self.state.borrow_mut().identity = None;
    }

    /// Every call fails with [`StoreError::Unavailable`] while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }

    /// Writes and reads fail with a rejection carrying `message` while set
    pub fn fail_with(&self, message: Option<&str>) {
        self.state.borrow_mut().failure = message.map(str::to_string);
    }

    /// Number of `create` calls, successful or not
    pub fn create_calls(&self) -> usize {
        self.create_calls.get()
    }

    /// Every stored row, regardless of owner
    pub fn all_documents(&self) -> Vec<DocumentRecord> {
        self.state.borrow().documents.clone()
    }

    /// Store a row as-is, bypassing ownership
    pub fn insert_raw(&self, record: DocumentRecord) {
        self.state.borrow_mut().documents.push(record);
    }

    fn check(&self) -> Result<(), StoreError> {
        let state = self.state.borrow();
        if state.unavailable {
            return Err(StoreError::Unavailable);
        }
        if let Some(message) = &state.failure {
            return Err(StoreError::Rejected {
                status: 500,
                message: message.clone(),
            });
        }
        Ok(())
    }

    fn visible_to_current(&self, record: &DocumentRecord) -> bool {
        match &self.state.borrow().identity {
            Some(identity) => record.user_id.as_deref() == Some(identity.user_id.as_str()),
            None => false,
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        if self.state.borrow().unavailable {
            return Err(StoreError::Unavailable);
        }
        Ok(self.state.borrow().identity.clone())
    }

    async fn create(&self, owner: &Identity, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        self.create_calls.set(self.create_calls.get() + 1);
        self.check()?;

        let record = DocumentRecord {
            id: DocumentId::new(Uuid::new_v4().to_string()),
            user_id: Some(owner.user_id.clone()),
            doc_type: document.doc_type,
            customer_name: document.customer_name,
            data: document.data,
            signatures: document.signatures,
            created_at: Utc::now(),
        };
        debug!(id = %record.id, doc_type = %record.doc_type, "Stored document in memory");
        self.state.borrow_mut().documents.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        self.check()?;
        let state = self.state.borrow();
        Ok(state
            .documents
            .iter()
            .find(|record| &record.id == id)
            .filter(|record| self.visible_to_current(record))
            .cloned())
    }

    async fn list_recent(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        self.check()?;
        let state = self.state.borrow();
        // Later inserts first among equal timestamps
        let mut rows: Vec<&DocumentRecord> = state
            .documents
            .iter()
            .rev()
            .filter(|record| self.visible_to_current(record))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().map(DocumentRecord::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DocType, RecordData, Signatures};
    use chrono::{Duration, TimeZone};

    fn new_doc(customer: &str) -> NewDocument {
        NewDocument {
            doc_type: DocType::WorkReport,
            customer_name: customer.to_string(),
            data: RecordData::new(),
            signatures: Signatures::default(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_owner() {
        let alice = Identity::new("alice");
        let store = MemoryStore::signed_in(alice.clone());

        let record = store.create(&alice, new_doc("Erika")).await.unwrap();
        assert_eq!(record.user_id.as_deref(), Some("alice"));
        assert!(!record.id.as_str().is_empty());

        let fetched = store.get(&record.id).await.unwrap();
        assert_eq!(fetched, Some(record));
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_rows_of_other_users_are_invisible() {
        let alice = Identity::new("alice");
        let store = MemoryStore::signed_in(alice.clone());
        let record = store.create(&alice, new_doc("Erika")).await.unwrap();

        store.sign_in(Identity::new("bob"));
        assert_eq!(store.get(&record.id).await.unwrap(), None);
        assert!(store.list_recent().await.unwrap().is_empty());

        store.sign_out();
        assert_eq!(store.get(&record.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first() {
        let store = MemoryStore::signed_in(Identity::new("alice"));
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        for (i, name) in ["first", "third", "second"].iter().enumerate() {
            let offset = match i {
                0 => 0,
                1 => 120,
                _ => 60,
            };
            store.insert_raw(DocumentRecord {
                id: DocumentId::new(name.to_string()),
                user_id: Some("alice".to_string()),
                doc_type: DocType::PrivacyConsent,
                customer_name: name.to_string(),
                data: RecordData::new(),
                signatures: Signatures::default(),
                created_at: base + Duration::minutes(offset),
            });
        }

        let names: Vec<String> = store
            .list_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.customer_name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let alice = Identity::new("alice");
        let store = MemoryStore::signed_in(alice.clone());

        store.fail_with(Some("duplicate key"));
        let err = store.create(&alice, new_doc("Erika")).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 500, ref message } if message == "duplicate key"));
        assert_eq!(store.create_calls(), 1);
        assert!(store.all_documents().is_empty());

        store.fail_with(None);
        store.set_unavailable(true);
        assert!(matches!(store.current_identity().await, Err(StoreError::Unavailable)));
    }
}
