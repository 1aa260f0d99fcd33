//! Save and load sequencing
//!
//! Saving stores the record first and only then prints the PDF: a stored
//! record is never rolled back because the PDF step failed.

use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::error::FormError;
use crate::forms::FormDefinition;
use crate::mail::mailto_link;
use crate::pdf::PdfRenderer;
use crate::record::{DocumentId, DocumentRecord, DocumentSummary, NewDocument, Signatures};
use crate::schema::FormValues;
use crate::store::DocumentStore;

/// What happened after the record was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No PDF library loaded; the record is only in the archive
    ArchivedOnly,
    /// The PDF step failed; the record is stored anyway
    RenderFailed(String),
    /// PDF downloaded; the mail hand-off is ready
    Ready { mailto: String },
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub record: DocumentRecord,
    pub delivery: Delivery,
}

impl SaveOutcome {
    /// Alert for degraded deliveries, `None` on full success
    pub fn alert_text(&self, form: &FormDefinition) -> Option<String> {
        match &self.delivery {
            Delivery::ArchivedOnly => Some(form.renderer_missing_alert().to_string()),
            Delivery::RenderFailed(detail) => Some(form.render_failed_alert(detail)),
            Delivery::Ready { .. } => None,
        }
    }
}

/// A stored document mapped back onto a form
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub id: DocumentId,
    pub customer_name: String,
    pub values: FormValues,
    pub signatures: Signatures,
    pub unknown_keys: Vec<String>,
}

/// Keep only the signers the form has
fn signatures_for(form: &FormDefinition, signatures: Signatures) -> Signatures {
    let mut kept = Signatures::default();
    for role in form.signer_roles {
        kept.set(*role, signatures.get(*role).cloned());
    }
    kept
}

pub async fn save_document<S, R>(
    ctx: &AppContext<S, R>,
    form: &FormDefinition,
    values: &FormValues,
    signatures: Signatures,
) -> Result<SaveOutcome, FormError>
where
    S: DocumentStore,
    R: PdfRenderer,
{
    let identity = ctx
        .store()
        .current_identity()
        .await?
        .ok_or(FormError::NotAuthenticated)?;

    let document = NewDocument {
        doc_type: form.doc_type,
        customer_name: form.customer_label(values),
        data: form.schema_for_values(values).to_record_data(values),
        signatures: signatures_for(form, signatures),
    };

    let record = ctx.store().create(&identity, document).await.map_err(|e| {
        error!(doc_type = %form.doc_type, error = %e, "Failed to store document");
        e
    })?;
    info!(id = %record.id, doc_type = %record.doc_type, customer = %record.customer_name, "Document stored");

    let renderer = ctx.renderer();
    if !renderer.is_available() {
        warn!(id = %record.id, "PDF renderer not loaded; document archived only");
        return Ok(SaveOutcome {
            record,
            delivery: Delivery::ArchivedOnly,
        });
    }

    let delivery = match renderer.render(form.root_element_id, &form.pdf).await {
        Ok(()) => Delivery::Ready {
            mailto: mailto_link(&ctx.config().mail_recipient, &form.mail),
        },
        Err(e) => {
            warn!(id = %record.id, error = %e, "PDF export failed after the document was stored");
            Delivery::RenderFailed(e.0)
        }
    };

    Ok(SaveOutcome { record, delivery })
}

pub async fn load_document<S, R>(
    ctx: &AppContext<S, R>,
    form: &FormDefinition,
    id: &DocumentId,
) -> Result<LoadedDocument, FormError>
where
    S: DocumentStore,
    R: PdfRenderer,
{
    let not_found = || FormError::NotFound {
        id: id.to_string(),
        message: form.not_found_message.to_string(),
    };

    let record = match ctx.store().get(id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(not_found()),
        Err(e) => {
            error!(%id, error = %e, "Failed to load document");
            return Err(FormError::Load(e));
        }
    };

    if record.doc_type != form.doc_type {
        warn!(%id, stored = %record.doc_type, page = %form.doc_type, "Document belongs to another form");
        return Err(not_found());
    }

    let loaded = form.schema_for_data(&record.data).from_record_data(&record.data);
    info!(%id, doc_type = %record.doc_type, "Document loaded");

    Ok(LoadedDocument {
        id: record.id,
        customer_name: record.customer_name,
        values: loaded.values,
        signatures: signatures_for(form, record.signatures),
        unknown_keys: loaded.unknown_keys,
    })
}

/// Archive list; failures degrade to an empty list
pub async fn list_documents<S, R>(ctx: &AppContext<S, R>) -> Vec<DocumentSummary>
where
    S: DocumentStore,
    R: PdfRenderer,
{
    match ctx.store().list_recent().await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Failed to list documents");
            Vec::new()
        }
    }
}
