//! Typed field schema
//!
//! A [`FormSchema`] lists every input a page persists. Values travel keyed by
//! descriptor id; radios use `<group>:<value>` as their id so the stored key
//! and the descriptor id are the same string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::{FieldValue, RecordData};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    TextArea,
    Date,
    Number,
    Select,
    Checkbox,
    Radio { group: String, value: String },
}

impl FieldKind {
    /// Text-like inputs carry a string value; the rest are toggles
    pub fn is_toggle(&self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Text)
    }

    pub fn text_area(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::TextArea)
    }

    pub fn date(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Date)
    }

    pub fn number(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Number)
    }

    pub fn select(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Select)
    }

    pub fn checkbox(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Checkbox)
    }

    pub fn radio(group: impl Into<String>, value: impl Into<String>) -> Self {
        let group = group.into();
        let value = value.into();
        Self {
            id: radio_key(&group, &value),
            kind: FieldKind::Radio { group, value },
        }
    }

    /// Radio group name, if this is a radio
    pub fn group(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Radio { group, .. } => Some(group),
            _ => None,
        }
    }
}

/// Stored key of a radio option
pub fn radio_key(group: &str, value: &str) -> String {
    format!("{}:{}", group, value)
}

/// Value of one input as read from or written to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Text(String),
    Toggle(bool),
}

/// Page values keyed by descriptor id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, InputValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(id.into(), InputValue::Text(value.into()));
    }

    pub fn set_toggle(&mut self, id: impl Into<String>, checked: bool) {
        self.0.insert(id.into(), InputValue::Toggle(checked));
    }

    pub fn with_text(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_text(id, value);
        self
    }

    pub fn with_toggle(mut self, id: impl Into<String>, checked: bool) -> Self {
        self.set_toggle(id, checked);
        self
    }

    pub fn get(&self, id: &str) -> Option<&InputValue> {
        self.0.get(id)
    }

    /// Text value, `None` if the id was never set or is a toggle
    pub fn text(&self, id: &str) -> Option<&str> {
        match self.0.get(id) {
            Some(InputValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_checked(&self, id: &str) -> bool {
        matches!(self.0.get(id), Some(InputValue::Toggle(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of applying a stored mapping to a schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedValues {
    pub values: FormValues,
    /// Stored keys the schema does not describe, left untouched
    pub unknown_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSchema {
    fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn push(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn extend(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Options of a radio group in declaration order
    pub fn radio_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a FieldDescriptor> {
        self.fields.iter().filter(move |f| f.group() == Some(group))
    }

    /// Persisted mapping for the given page values
    ///
    /// Text-like fields are always written, empty if unset. Checkboxes and
    /// radios are written as `true` only when checked.
    pub fn to_record_data(&self, values: &FormValues) -> RecordData {
        let mut data = RecordData::new();
        for field in &self.fields {
            if field.kind.is_toggle() {
                if values.is_checked(&field.id) {
                    data.insert(field.id.clone(), FieldValue::Checked);
                }
            } else {
                let text = values.text(&field.id).unwrap_or_default();
                data.insert(field.id.clone(), FieldValue::Text(text.to_string()));
            }
        }
        data
    }

    /// Page values for a stored mapping
    ///
    /// A stored toggle key means checked, whatever its value. Selecting a
    /// radio unchecks the other options of its group. Keys outside the schema
    /// are reported, not guessed at.
    pub fn from_record_data(&self, data: &RecordData) -> LoadedValues {
        let mut loaded = LoadedValues::default();

        for (key, value) in data {
            let Some(field) = self.field(key) else {
                loaded.unknown_keys.push(key.clone());
                continue;
            };

            match (&field.kind, value) {
                (FieldKind::Checkbox, _) => loaded.values.set_toggle(key.clone(), true),
                (FieldKind::Radio { group, .. }, _) => {
                    for option in self.radio_group(group) {
                        loaded.values.set_toggle(option.id.clone(), false);
                    }
                    loaded.values.set_toggle(key.clone(), true);
                }
                (_, FieldValue::Text(text)) => loaded.values.set_text(key.clone(), text.clone()),
                (_, FieldValue::Checked) => {
                    // `true` stored under a text input
                    loaded.unknown_keys.push(key.clone());
                }
            }
        }

        if !loaded.unknown_keys.is_empty() {
            warn!(keys = ?loaded.unknown_keys, "Stored keys not described by the form schema");
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldDescriptor::date("doc-date"),
            FieldDescriptor::text_area("customer-address"),
            FieldDescriptor::checkbox("check-a"),
            FieldDescriptor::checkbox("check-b"),
            FieldDescriptor::radio("result", "ok"),
            FieldDescriptor::radio("result", "defects"),
        ])
    }

    #[test]
    fn test_radio_descriptor_id_is_stored_key() {
        let radio = FieldDescriptor::radio("result", "ok");
        assert_eq!(radio.id, "result:ok");
        assert_eq!(radio.group(), Some("result"));
        assert_eq!(FieldDescriptor::text("x").group(), None);
    }

    #[test]
    fn test_to_record_data_writes_text_always_and_toggles_when_checked() {
        let values = FormValues::new()
            .with_text("customer-address", "Erika Mustermann\nHauptstr. 1")
            .with_toggle("check-a", true)
            .with_toggle("check-b", false)
            .with_toggle("result:defects", true);

        let data = schema().to_record_data(&values);

        let mut expected = RecordData::new();
        expected.insert("doc-date".into(), FieldValue::Text(String::new()));
        expected.insert(
            "customer-address".into(),
            FieldValue::Text("Erika Mustermann\nHauptstr. 1".into()),
        );
        expected.insert("check-a".into(), FieldValue::Checked);
        expected.insert("result:defects".into(), FieldValue::Checked);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_from_record_data_presence_means_checked() {
        let mut data = RecordData::new();
        data.insert("check-a".into(), FieldValue::Text("on".into()));
        let loaded = schema().from_record_data(&data);
        assert!(loaded.values.is_checked("check-a"));
        assert!(loaded.unknown_keys.is_empty());
    }

    #[test]
    fn test_from_record_data_reports_unknown_keys() {
        let mut data = RecordData::new();
        data.insert("doc-date".into(), FieldValue::Text("2026-10-19".into()));
        data.insert("legacy-field".into(), FieldValue::Text("x".into()));
        data.insert("customer-address".into(), FieldValue::Checked);

        let loaded = schema().from_record_data(&data);
        assert_eq!(loaded.values.text("doc-date"), Some("2026-10-19"));
        assert_eq!(
            loaded.unknown_keys,
            vec!["customer-address".to_string(), "legacy-field".to_string()]
        );
    }

    #[test]
    fn test_radio_selection_is_exclusive() {
        let mut data = RecordData::new();
        data.insert("result:ok".into(), FieldValue::Checked);
        let loaded = schema().from_record_data(&data);
        assert!(loaded.values.is_checked("result:ok"));
        assert_eq!(loaded.values.get("result:defects"), Some(&InputValue::Toggle(false)));
    }
}
