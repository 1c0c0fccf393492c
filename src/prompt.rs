//! Renders a classification schema and ticket content into the prompt pair
//! sent to the provider.

use crate::domain::schema::{ClassificationSchema, FieldDefinition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn build_prompt(content: &str, schema: &ClassificationSchema) -> Prompt {
    Prompt {
        system: build_system_prompt(schema),
        user: build_user_message(content),
    }
}

pub fn build_user_message(content: &str) -> String {
    format!("Classify the following support ticket:\n\n{}", content.trim())
}

pub fn build_system_prompt(schema: &ClassificationSchema) -> String {
    let mut prompt = String::from(
        "You are a support ticket classifier. Read the ticket and pick the best \
         matching topic, priority and custom field values from the options below. \
         Only use the IDs, keys and values listed here.\n",
    );

    if !schema.topics.is_empty() {
        prompt.push_str("\nAvailable topics:\n");
        for (id, name) in &schema.topics {
            prompt.push_str(&format!("- ID: {id}, Name: {name}\n"));
        }
    }

    if !schema.priorities.is_empty() {
        prompt.push_str("\nAvailable priorities:\n");
        for (id, name) in &schema.priorities {
            prompt.push_str(&format!("- ID: {id}, Name: {name}\n"));
        }
    }

    if !schema.custom_fields.is_empty() {
        prompt.push_str("\nCustom fields to fill in:\n");
        for (key, field) in &schema.custom_fields {
            prompt.push_str(&format!(
                "- {key} (Label: {}, Type: {})\n",
                field.label(),
                field.type_name()
            ));
            for hint in field_hints(field) {
                prompt.push_str(&format!("  {hint}\n"));
            }
        }
    }

    prompt.push_str(
        "\nRespond with JSON only, no explanations and no markdown. \
         Use null for anything you cannot determine and leave out custom fields \
         that do not apply. Use exactly this structure:\n",
    );
    prompt.push_str(&response_skeleton(schema));
    prompt
}

fn field_hints(field: &FieldDefinition) -> Vec<String> {
    let mut hints = Vec::new();
    match field {
        FieldDefinition::Text { .. } | FieldDefinition::Memo { .. } => {
            if let Some(limit) = field.max_length() {
                hints.push(format!("Max length: {limit} characters"));
            }
            if let Some(hint) = field.validator_hint() {
                hints.push(format!("Expected format: {hint}"));
            }
        }
        FieldDefinition::Choices {
            choices,
            multiselect,
            ..
        } => {
            let values = choices
                .iter()
                .map(|choice| choice.value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            hints.push(format!("Choices: {values}"));
            if *multiselect {
                hints.push("Multiple selections allowed, return as array".to_string());
            }
        }
        FieldDefinition::Bool { .. } => hints.push("Value: true/false".to_string()),
    }
    hints
}

fn response_skeleton(schema: &ClassificationSchema) -> String {
    let mut skeleton = String::from("{\n  \"topic_id\": <number>,\n  \"priority_id\": <number>,\n");
    if schema.custom_fields.is_empty() {
        skeleton.push_str("  \"custom_fields\": {}\n}");
        return skeleton;
    }

    skeleton.push_str("  \"custom_fields\": {\n");
    let entries = schema
        .custom_fields
        .iter()
        .map(|(key, field)| format!("    \"{key}\": {}", placeholder(field)))
        .collect::<Vec<_>>();
    skeleton.push_str(&entries.join(",\n"));
    skeleton.push_str("\n  }\n}");
    skeleton
}

fn placeholder(field: &FieldDefinition) -> &'static str {
    match field {
        FieldDefinition::Bool { .. } => "<true|false>",
        FieldDefinition::Choices {
            multiselect: true, ..
        } => "[\"<value>\", ...]",
        _ => "\"<value>\"",
    }
}
