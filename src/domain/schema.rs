//! The set of values a classification may reference.
//!
//! A schema is assembled by the host from its live configuration and thrown
//! away once the call returns. Topics and priorities are keyed by their
//! integer ids; custom fields by their unique key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSchema {
    #[serde(default)]
    pub topics: BTreeMap<i64, String>,
    #[serde(default)]
    pub priorities: BTreeMap<i64, String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, FieldDefinition>,
}

impl ClassificationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic(mut self, id: i64, name: impl Into<String>) -> Self {
        self.topics.insert(id, name.into());
        self
    }

    pub fn with_priority(mut self, id: i64, name: impl Into<String>) -> Self {
        self.priorities.insert(id, name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, definition: FieldDefinition) -> Self {
        self.custom_fields.insert(key.into(), definition);
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.custom_fields.get(key)
    }
}

/// A custom field the model may fill in. The set of kinds is closed: a host
/// field of any other type is never offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldDefinition {
    Text {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validator_hint: Option<String>,
    },
    Memo {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validator_hint: Option<String>,
    },
    Choices {
        label: String,
        choices: Vec<ChoiceOption>,
        #[serde(default)]
        multiselect: bool,
    },
    Bool {
        label: String,
    },
}

impl FieldDefinition {
    pub fn text(label: impl Into<String>) -> Self {
        FieldDefinition::Text {
            label: label.into(),
            max_length: None,
            validator_hint: None,
        }
    }

    pub fn memo(label: impl Into<String>) -> Self {
        FieldDefinition::Memo {
            label: label.into(),
            max_length: None,
            validator_hint: None,
        }
    }

    pub fn bool(label: impl Into<String>) -> Self {
        FieldDefinition::Bool {
            label: label.into(),
        }
    }

    /// Builds a choices field from `(key, display value)` pairs, keeping their order.
    pub fn choices<K, V>(
        label: impl Into<String>,
        choices: impl IntoIterator<Item = (K, V)>,
        multiselect: bool,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        FieldDefinition::Choices {
            label: label.into(),
            choices: choices
                .into_iter()
                .map(|(key, value)| ChoiceOption::new(key, value))
                .collect(),
            multiselect,
        }
    }

    /// Sets the maximum length of a text or memo field. Other kinds are unchanged.
    pub fn with_max_length(mut self, limit: usize) -> Self {
        if let FieldDefinition::Text { max_length, .. } | FieldDefinition::Memo { max_length, .. } =
            &mut self
        {
            *max_length = Some(limit);
        }
        self
    }

    /// Sets the advisory format hint of a text or memo field.
    pub fn with_validator_hint(mut self, hint: impl Into<String>) -> Self {
        if let FieldDefinition::Text { validator_hint, .. }
        | FieldDefinition::Memo { validator_hint, .. } = &mut self
        {
            *validator_hint = Some(hint.into());
        }
        self
    }

    pub fn label(&self) -> &str {
        match self {
            FieldDefinition::Text { label, .. }
            | FieldDefinition::Memo { label, .. }
            | FieldDefinition::Choices { label, .. }
            | FieldDefinition::Bool { label } => label,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldDefinition::Text { .. } => "text",
            FieldDefinition::Memo { .. } => "memo",
            FieldDefinition::Choices { .. } => "choices",
            FieldDefinition::Bool { .. } => "bool",
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        match self {
            FieldDefinition::Text { max_length, .. } | FieldDefinition::Memo { max_length, .. } => {
                max_length.filter(|limit| *limit > 0)
            }
            _ => None,
        }
    }

    pub fn validator_hint(&self) -> Option<&str> {
        match self {
            FieldDefinition::Text { validator_hint, .. }
            | FieldDefinition::Memo { validator_hint, .. } => validator_hint
                .as_deref()
                .map(str::trim)
                .filter(|hint| !hint.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_field_definitions() {
        let json = r#"{
            "topics": {"1": "Billing", "2": "Hardware"},
            "priorities": {"3": "Emergency"},
            "custom_fields": {
                "email": {"type": "text", "label": "Contact email", "max_length": 80, "validator_hint": "email"},
                "risk": {"type": "choices", "label": "Risk", "choices": [
                    {"key": "lo", "value": "Low Risk"},
                    {"key": "hi", "value": "High Risk"}
                ]},
                "vip": {"type": "bool", "label": "VIP customer"}
            }
        }"#;
        let schema: ClassificationSchema = serde_json::from_str(json).unwrap();

        assert_eq!(schema.topics.get(&2).map(String::as_str), Some("Hardware"));
        assert_eq!(schema.priorities.len(), 1);
        let email = schema.field("email").unwrap();
        assert_eq!(email.type_name(), "text");
        assert_eq!(email.max_length(), Some(80));
        assert_eq!(email.validator_hint(), Some("email"));
        match schema.field("risk").unwrap() {
            FieldDefinition::Choices {
                choices,
                multiselect,
                ..
            } => {
                assert!(!multiselect);
                assert_eq!(choices[0], ChoiceOption::new("lo", "Low Risk"));
                assert_eq!(choices[1].key, "hi");
            }
            other => panic!("unexpected field kind {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_field_type() {
        let json = r#"{"custom_fields": {"when": {"type": "datetime", "label": "When"}}}"#;
        assert!(serde_json::from_str::<ClassificationSchema>(json).is_err());
    }

    #[test]
    fn length_limit_applies_only_to_text_kinds() {
        assert_eq!(FieldDefinition::memo("Notes").with_max_length(10).max_length(), Some(10));
        assert_eq!(FieldDefinition::bool("Flag").with_max_length(10).max_length(), None);
        assert_eq!(FieldDefinition::text("Zero").with_max_length(0).max_length(), None);
    }
}
