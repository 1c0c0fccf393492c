//! Turns the model's raw reply into a [`ClassificationResult`] that only
//! references values present in the schema.
//!
//! The reply is untrusted. Only a reply that is not JSON at all is an error;
//! every individual id or field that does not fit the schema is dropped.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::domain::classification::{ClassificationResult, FieldValue};
use crate::domain::schema::{ChoiceOption, ClassificationSchema, FieldDefinition};
use crate::error::{AppError, AppResult};

const EXCERPT_LIMIT: usize = 200;

pub fn validate_response(raw: &str, schema: &ClassificationSchema) -> AppResult<ClassificationResult> {
    let payload = parse_payload(raw)?;

    let topic_id = payload
        .get("topic_id")
        .and_then(coerce_id)
        .filter(|id| schema.topics.contains_key(id));
    let priority_id = payload
        .get("priority_id")
        .and_then(coerce_id)
        .filter(|id| schema.priorities.contains_key(id));

    let custom_fields = payload
        .get("custom_fields")
        .and_then(Value::as_object)
        .map(|fields| coerce_custom_fields(fields, schema))
        .unwrap_or_default();

    Ok(ClassificationResult {
        topic_id,
        priority_id,
        custom_fields,
    })
}

fn parse_payload(raw: &str) -> AppResult<Map<String, Value>> {
    let text = strip_code_fence(raw);
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(parse_error(
            raw,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(err) => Err(parse_error(raw, err.to_string())),
    }
}

fn parse_error(raw: &str, reason: String) -> AppError {
    AppError::Parse {
        reason,
        excerpt: raw.trim().chars().take(EXCERPT_LIMIT).collect(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Removes a surrounding markdown code fence (```` ```json ```` or bare ```` ``` ````).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_custom_fields(
    fields: &Map<String, Value>,
    schema: &ClassificationSchema,
) -> BTreeMap<String, FieldValue> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            let definition = schema.field(key)?;
            coerce_field(definition, value).map(|coerced| (key.clone(), coerced))
        })
        .collect()
}

fn coerce_field(definition: &FieldDefinition, value: &Value) -> Option<FieldValue> {
    match definition {
        FieldDefinition::Bool { .. } => coerce_bool(value).map(FieldValue::Bool),
        FieldDefinition::Choices {
            choices,
            multiselect: false,
            ..
        } => resolve_choice(choices, value).map(FieldValue::Choice),
        FieldDefinition::Choices {
            choices,
            multiselect: true,
            ..
        } => {
            let selected = match value {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| resolve_choice(choices, item))
                    .collect::<BTreeSet<_>>(),
                scalar => resolve_choice(choices, scalar).into_iter().collect(),
            };
            (!selected.is_empty()).then_some(FieldValue::Choices(selected))
        }
        FieldDefinition::Text { .. } | FieldDefinition::Memo { .. } => {
            let text = coerce_text(value)?;
            Some(FieldValue::Text(truncate_chars(text, definition.max_length())))
        }
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Some(true),
            "false" | "no" | "n" | "0" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Matches a display value first (exactly, then ignoring case), then a key.
fn resolve_choice(choices: &[ChoiceOption], value: &Value) -> Option<String> {
    let candidate = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if candidate.is_empty() {
        return None;
    }

    choices
        .iter()
        .find(|choice| choice.value == candidate)
        .or_else(|| {
            choices
                .iter()
                .find(|choice| choice.value.to_lowercase() == candidate.to_lowercase())
        })
        .or_else(|| choices.iter().find(|choice| choice.key == candidate))
        .map(|choice| choice.key.clone())
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn truncate_chars(text: String, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if text.chars().count() > limit => text.chars().take(limit).collect(),
        _ => text,
    }
}
