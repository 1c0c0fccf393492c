pub mod classification;
pub mod schema;
pub mod ticket;

pub use classification::{ClassificationResult, FieldValue};
pub use schema::{ChoiceOption, ClassificationSchema, FieldDefinition};
pub use ticket::TicketContent;
