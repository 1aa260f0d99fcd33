//! Field form records
//!
//! Everything the form pages do besides drawing signatures:
//! - [`record`]: the persisted document shape
//! - [`schema`]: typed field descriptors mapping page values to record data
//! - [`forms`]: the acceptance protocol, work report and privacy consent pages
//! - [`store`]: remote document store contract plus an in-memory store
//! - [`pdf`] / [`mail`]: PDF export contract and mailto hand-off
//! - [`flow`]: save and load sequencing with the error taxonomy
//! - [`config`] / [`context`]: configuration and the injected app context

pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod flow;
pub mod forms;
pub mod mail;
pub mod navigation;
pub mod pdf;
pub mod record;
pub mod schema;
pub mod store;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{ConfigError, FormError, RenderError, StoreError};
pub use flow::{
    list_documents, load_document, save_document, Delivery, LoadedDocument, SaveOutcome,
};
pub use forms::{DateTarget, FormDefinition, MaterialItem};
pub use mail::{mailto_link, MailTemplate};
pub use navigation::{guard, Redirect};
pub use pdf::{PdfMargin, PdfOptions, PdfRenderer};
pub use record::{
    DocType, DocumentId, DocumentRecord, DocumentSummary, FieldValue, NewDocument, RecordData,
    SignerRole, Signatures,
};
pub use schema::{FieldDescriptor, FieldKind, FormSchema, FormValues, InputValue, LoadedValues};
pub use store::{DocumentStore, Identity, MemoryStore};

// Signature types travel inside records
pub use signature_pad::{EncodedImage, ResizePolicy};
