//! Persisted document shape
//!
//! ```json
//! {
//!   "type": "Abnahmeprotokoll",
//!   "customer_name": "Erika Mustermann",
//!   "data": { "doc-date": "2026-10-19", "check-commissioning": true, "result:ok": true },
//!   "signatures": { "tech": "data:image/png;base64,...", "customer": "data:image/png;base64,..." }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use signature_pad::EncodedImage;

/// Which form a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "Abnahmeprotokoll")]
    AcceptanceProtocol,
    #[serde(rename = "Arbeitsnachweis")]
    WorkReport,
    #[serde(rename = "Datenschutz")]
    PrivacyConsent,
}

impl DocType {
    pub const ALL: [DocType; 3] = [
        DocType::AcceptanceProtocol,
        DocType::WorkReport,
        DocType::PrivacyConsent,
    ];

    /// Stored type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::AcceptanceProtocol => "Abnahmeprotokoll",
            DocType::WorkReport => "Arbeitsnachweis",
            DocType::PrivacyConsent => "Datenschutz",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stored field value: a string, or `true` for a checked toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked,
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Checked => serializer.serialize_bool(true),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldValueVisitor;

        impl<'de> Visitor<'de> for FieldValueVisitor {
            type Value = FieldValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or `true`")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
                if v {
                    Ok(FieldValue::Checked)
                } else {
                    Err(E::invalid_value(de::Unexpected::Bool(false), &self))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
                Ok(FieldValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
                Ok(FieldValue::Text(v))
            }
        }

        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// Field id (or `group:value` for radios) to value
pub type RecordData = BTreeMap<String, FieldValue>;

/// Store-generated record identifier. Accepts numeric ids on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => DocumentId(s),
            RawId::Number(n) => DocumentId(n.to_string()),
        })
    }
}

/// Signer whose signature a pad captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    Tech,
    Customer,
}

impl SignerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerRole::Tech => "tech",
            SignerRole::Customer => "customer",
        }
    }

    /// Element id of the role's canvas on every page
    pub fn canvas_id(&self) -> &'static str {
        match self {
            SignerRole::Tech => "signature-tech",
            SignerRole::Customer => "signature-customer",
        }
    }
}

/// Signature images by signer; absent means nothing was captured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<EncodedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<EncodedImage>,
}

impl Signatures {
    pub fn get(&self, role: SignerRole) -> Option<&EncodedImage> {
        match role {
            SignerRole::Tech => self.tech.as_ref(),
            SignerRole::Customer => self.customer.as_ref(),
        }
    }

    pub fn set(&mut self, role: SignerRole, image: Option<EncodedImage>) {
        match role {
            SignerRole::Tech => self.tech = image,
            SignerRole::Customer => self.customer = image,
        }
    }
}

/// Payload for the store's create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub customer_name: String,
    pub data: RecordData,
    pub signatures: Signatures,
}

/// A stored document as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub customer_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: RecordData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signatures: Signatures,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            doc_type: self.doc_type,
            customer_name: self.customer_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Row of the archive list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
