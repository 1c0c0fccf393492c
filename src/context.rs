use std::sync::Arc;

use triage::services::TicketClassifier;

#[derive(Clone)]
pub struct AppContext {
    pub classifier: Arc<dyn TicketClassifier>,
}

impl AppContext {
    pub fn new(classifier: Arc<dyn TicketClassifier>) -> Self {
        Self { classifier }
    }
}
