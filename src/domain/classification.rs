use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// A schema-conformant classification. Ids are either absent or present in
/// the schema the result was validated against; custom-field keys likewise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub topic_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub custom_fields: BTreeMap<String, FieldValue>,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.topic_id.is_none() && self.priority_id.is_none() && self.custom_fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    /// Key of the selected choice.
    Choice(String),
    /// Keys of the selected choices of a multiselect field.
    Choices(BTreeSet<String>),
}
