//! Error taxonomy for the form pages
//!
//! Every failure the operator sees ends up as a plain alert; `alert_text`
//! produces that text. Decode failures of signature images never reach this
//! module: restores are best effort and only logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document store client is not initialized")]
    Unavailable,

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected store response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

#[derive(Debug, Error)]
#[error("PDF export failed: {0}")]
pub struct RenderError(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("storeUrl must not be empty")]
    MissingStoreUrl,

    #[error("storeUrl must be an http(s) URL, got {0}")]
    InvalidStoreUrl(String),

    #[error("anonKey must not be empty")]
    MissingAnonKey,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A store read failed while loading a document
    #[error("Failed to load document: {0}")]
    Load(#[source] StoreError),

    #[error("Document {id} not found")]
    NotFound { id: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FormError {
    /// Text shown to the operator
    pub fn alert_text(&self) -> String {
        match self {
            FormError::NotAuthenticated => "Nicht eingeloggt! Speichern nicht möglich.".to_string(),
            FormError::Store(StoreError::Unavailable) => {
                "Datenbank-Verbindung fehlt! (Client nicht initialisiert)".to_string()
            }
            FormError::Store(StoreError::Rejected { message, .. }) => {
                format!("Fehler beim Speichern in der Datenbank: {}", message)
            }
            FormError::Store(e) => format!("Fehler beim Speichern in der Datenbank: {}", e),
            FormError::Load(StoreError::Unavailable) => {
                "Datenbank-Verbindung fehlt! (Client nicht initialisiert)".to_string()
            }
            FormError::Load(StoreError::Rejected { message, .. }) => {
                format!("Fehler beim Laden aus der Datenbank: {}", message)
            }
            FormError::Load(e) => format!("Fehler beim Laden aus der Datenbank: {}", e),
            FormError::NotFound { message, .. } => message.clone(),
            FormError::Config(e) => format!("Fehler: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_text_not_authenticated() {
        assert_eq!(
            FormError::NotAuthenticated.alert_text(),
            "Nicht eingeloggt! Speichern nicht möglich."
        );
    }

    #[test]
    fn test_alert_text_carries_store_message() {
        let err = FormError::Store(StoreError::Rejected {
            status: 409,
            message: "duplicate key".to_string(),
        });
        assert_eq!(
            err.alert_text(),
            "Fehler beim Speichern in der Datenbank: duplicate key"
        );
    }

    #[test]
    fn test_alert_text_load_failure_carries_store_message() {
        let err = FormError::Load(StoreError::Rejected {
            status: 401,
            message: "JWT expired".to_string(),
        });
        assert_eq!(err.alert_text(), "Fehler beim Laden aus der Datenbank: JWT expired");
    }

    #[test]
    fn test_alert_text_not_found_uses_form_message() {
        let err = FormError::NotFound {
            id: "42".to_string(),
            message: "Dokument nicht gefunden.".to_string(),
        };
        assert_eq!(err.alert_text(), "Dokument nicht gefunden.");
        assert_eq!(err.to_string(), "Document 42 not found");
    }
}
