//! The three field forms: heat pump acceptance protocol, work report and
//! privacy consent.
//!
//! A [`FormDefinition`] carries everything page-specific: element ids, the
//! field schema, signers, PDF options, mail template and operator messages.

use crate::mail::MailTemplate;
use crate::pdf::{PdfMargin, PdfOptions};
use crate::record::{DocType, FieldValue, RecordData, SignerRole};
use crate::schema::{FieldDescriptor, FormSchema, FormValues};

/// Stored when the customer field is empty
pub const UNKNOWN_CUSTOMER: &str = "Unbekannt";

/// Select that chooses the work report's material preset
pub const JOB_TYPE_FIELD: &str = "job-type";

/// Where the page shows the current date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTarget {
    /// `<input type=date>` prefilled with today's ISO date when empty
    Input(&'static str),
    /// Element whose text becomes today's `dd.mm.yyyy` stamp
    Text(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialItem {
    pub label: &'static str,
    pub unit: &'static str,
}

static DAIKIN_HEATPUMP: [MaterialItem; 10] = [
    MaterialItem { label: "Kupferrohr 35mm", unit: "m" },
    MaterialItem { label: "Kupferrohr 28mm", unit: "m" },
    MaterialItem { label: "Kupferrohr 22mm", unit: "m" },
    MaterialItem { label: "Isolierung 35mm", unit: "m" },
    MaterialItem { label: "Fittinge 35mm", unit: "Stk" },
    MaterialItem { label: "Fittinge 28mm", unit: "Stk" },
    MaterialItem { label: "Fittinge 22mm", unit: "Stk" },
    MaterialItem { label: "Kesselsicherheitsgruppe", unit: "Stk" },
    MaterialItem { label: "Schrägsitz-Absperrventil", unit: "Stk" },
    MaterialItem { label: "Erdleitung DN35", unit: "m" },
];

/// Material rows for a job type; `None` for unknown or empty job types
pub fn job_preset(job_type: &str) -> Option<&'static [MaterialItem]> {
    match job_type {
        "daikin-heatpump" => Some(&DAIKIN_HEATPUMP[..]),
        _ => None,
    }
}

pub fn material_field_id(index: usize) -> String {
    format!("mat-{}", index)
}

#[derive(Debug, Clone)]
pub struct FormDefinition {
    pub doc_type: DocType,
    /// Element printed into the PDF
    pub root_element_id: &'static str,
    pub save_button_id: &'static str,
    pub date_target: DateTarget,
    pub schema: FormSchema,
    pub signer_roles: &'static [SignerRole],
    /// Candidate fields for the customer label; the first one present wins
    pub customer_source: &'static [&'static str],
    pub pdf: PdfOptions,
    pub mail: MailTemplate,
    pub not_found_message: &'static str,
    renderer_missing_message: &'static str,
}

impl FormDefinition {
    pub fn for_doc_type(doc_type: DocType) -> Self {
        match doc_type {
            DocType::AcceptanceProtocol => Self::acceptance_protocol(),
            DocType::WorkReport => Self::work_report(),
            DocType::PrivacyConsent => Self::privacy_consent(),
        }
    }

    pub fn acceptance_protocol() -> Self {
        let schema = FormSchema::new(vec![
            FieldDescriptor::date("doc-date"),
            FieldDescriptor::text_area("customer-address"),
            FieldDescriptor::text("technician-name"),
            FieldDescriptor::text("device-model"),
            FieldDescriptor::text("serial-outdoor"),
            FieldDescriptor::text("serial-indoor"),
            FieldDescriptor::checkbox("check-installation"),
            FieldDescriptor::checkbox("check-hydraulics"),
            FieldDescriptor::checkbox("check-electrical"),
            FieldDescriptor::checkbox("check-commissioning"),
            FieldDescriptor::checkbox("check-instruction"),
            FieldDescriptor::checkbox("check-documents"),
            FieldDescriptor::radio("result", "ok"),
            FieldDescriptor::radio("result", "defects"),
            FieldDescriptor::text_area("defects"),
            FieldDescriptor::text_area("remarks"),
        ]);

        Self {
            doc_type: DocType::AcceptanceProtocol,
            root_element_id: "protocol-form",
            save_button_id: "save-btn",
            date_target: DateTarget::Input("doc-date"),
            schema,
            signer_roles: &[SignerRole::Tech, SignerRole::Customer],
            customer_source: &["customer-address"],
            pdf: PdfOptions::new(
                "Abnahmeprotokoll_WP.pdf",
                PdfMargin::Sides([10.0, 10.0, 10.0, 10.0]),
            ),
            mail: MailTemplate::new(
                "Abnahmeprotokoll WP",
                "Hallo,\n\nanbei das Abnahmeprotokoll als PDF.\n\n\
                 (Bitte die soeben heruntergeladene PDF-Datei manuell anhängen.)",
            ),
            not_found_message: "Dokument nicht gefunden oder Zugriff verweigert.",
            renderer_missing_message:
                "Warnung: PDF-Generator konnte nicht geladen werden.\nProtokoll nur im Archiv gespeichert.",
        }
    }

    pub fn work_report() -> Self {
        let schema = FormSchema::new(vec![
            FieldDescriptor::text_area("customer-info"),
            FieldDescriptor::text("order-number"),
            FieldDescriptor::text("technician-name"),
            FieldDescriptor::select(JOB_TYPE_FIELD),
            FieldDescriptor::text_area("work-description"),
            FieldDescriptor::number("work-hours"),
            FieldDescriptor::number("travel-hours"),
            FieldDescriptor::radio("work-status", "done"),
            FieldDescriptor::radio("work-status", "open"),
            FieldDescriptor::text_area("remarks"),
        ]);

        Self {
            doc_type: DocType::WorkReport,
            root_element_id: "work-order",
            save_button_id: "send-button",
            date_target: DateTarget::Text("today-date"),
            schema,
            signer_roles: &[SignerRole::Tech, SignerRole::Customer],
            customer_source: &["customer-info", "customer-name"],
            pdf: PdfOptions::new("Arbeitsnachweis.pdf", PdfMargin::Uniform(5.0)),
            mail: MailTemplate::new("Arbeitsnachweis", "Anbei der Arbeitsnachweis."),
            not_found_message: "Zugriff verweigert oder Dokument existiert nicht.",
            renderer_missing_message: "Warnung: PDF-Lib fehlt. Gespeichert im Archiv.",
        }
    }

    pub fn privacy_consent() -> Self {
        let schema = FormSchema::new(vec![
            FieldDescriptor::text("customer-name"),
            FieldDescriptor::text("customer-street"),
            FieldDescriptor::text("customer-city"),
            FieldDescriptor::checkbox("consent-data-processing"),
            FieldDescriptor::checkbox("consent-photos"),
            FieldDescriptor::checkbox("consent-contact"),
            FieldDescriptor::text("sign-place"),
        ]);

        Self {
            doc_type: DocType::PrivacyConsent,
            root_element_id: "consent-form",
            save_button_id: "save-button",
            date_target: DateTarget::Text("today-date"),
            schema,
            signer_roles: &[SignerRole::Customer],
            customer_source: &["customer-name"],
            pdf: PdfOptions::new("Datenschutz.pdf", PdfMargin::Uniform(10.0)),
            mail: MailTemplate::new("Datenschutzerklärung", "Anbei die Datenschutzerklärung."),
            not_found_message: "Dokument nicht gefunden.",
            renderer_missing_message: "Warnung: PDF-Lib fehlt. Gespeichert im Archiv.",
        }
    }

    pub fn has_signer(&self, role: SignerRole) -> bool {
        self.signer_roles.contains(&role)
    }

    /// Label stored for the archive list: first line of the first customer
    /// field the page has, trimmed
    pub fn customer_label(&self, values: &FormValues) -> String {
        let line = self
            .customer_source
            .iter()
            .find_map(|id| values.text(id))
            .and_then(|text| text.lines().next())
            .map(str::trim)
            .unwrap_or_default();

        if line.is_empty() {
            UNKNOWN_CUSTOMER.to_string()
        } else {
            line.to_string()
        }
    }

    /// Material rows currently shown on the page
    pub fn materials_for(&self, job_type: Option<&str>) -> &'static [MaterialItem] {
        if self.doc_type != DocType::WorkReport {
            return &[];
        }
        job_type.and_then(job_preset).unwrap_or(&[])
    }

    /// Static schema plus the material fields of the selected job type
    pub fn schema_for_job(&self, job_type: Option<&str>) -> FormSchema {
        let materials = self.materials_for(job_type);
        self.schema
            .clone()
            .extend((0..materials.len()).map(|i| FieldDescriptor::number(material_field_id(i))))
    }

    pub fn schema_for_values(&self, values: &FormValues) -> FormSchema {
        self.schema_for_job(values.text(JOB_TYPE_FIELD))
    }

    pub fn schema_for_data(&self, data: &RecordData) -> FormSchema {
        let job_type = match data.get(JOB_TYPE_FIELD) {
            Some(FieldValue::Text(job)) => Some(job.as_str()),
            _ => None,
        };
        self.schema_for_job(job_type)
    }

    /// Alert shown when the PDF library is not loaded
    pub fn renderer_missing_alert(&self) -> &'static str {
        self.renderer_missing_message
    }

    /// Alert shown when rendering the PDF failed after the record was stored
    pub fn render_failed_alert(&self, detail: &str) -> String {
        match self.doc_type {
            DocType::AcceptanceProtocol => format!(
                "Fehler bei der PDF-Erstellung. Daten im Archiv gesichert.\n\nDetail: {}",
                detail
            ),
            DocType::WorkReport | DocType::PrivacyConsent => format!(
                "PDF Fehler: {}\n\nDaten wurden trotzdem gespeichert.",
                detail
            ),
        }
    }
}
