//! Mail hand-off
//!
//! After the PDF is downloaded the operator sends it from their own mail
//! client; the page only prepares a `mailto:` link.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailTemplate {
    pub subject: String,
    pub body: String,
}

impl MailTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// `mailto:` link with percent-encoded subject and body
pub fn mailto_link(recipient: &str, template: &MailTemplate) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        recipient.trim(),
        urlencoding::encode(&template.subject),
        urlencoding::encode(&template.body)
    )
}
