use triage::domain::classification::ClassificationResult;
use triage::domain::schema::ClassificationSchema;
use triage::domain::ticket::TicketContent;
use triage::error::AppResult;

use crate::context::AppContext;

pub struct ClassifyOutcome {
    pub result: ClassificationResult,
    /// Schema entries the model left unset or answered with unusable values.
    pub unresolved_fields: Vec<String>,
}

pub async fn classify_ticket(
    ctx: &AppContext,
    ticket: &TicketContent,
    schema: &ClassificationSchema,
) -> AppResult<ClassifyOutcome> {
    let content = ticket.render();
    let result = ctx.classifier.classify(&content, schema).await?;

    let unresolved_fields = schema
        .custom_fields
        .keys()
        .filter(|key| !result.custom_fields.contains_key(*key))
        .cloned()
        .collect();

    Ok(ClassifyOutcome {
        result,
        unresolved_fields,
    })
}
