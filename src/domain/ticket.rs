/// Plain-text ticket content handed to the classifier. Markup is the host's
/// problem; nothing here strips HTML.
#[derive(Debug, Clone, Default)]
pub struct TicketContent {
    pub subject: String,
    pub body: String,
}

impl TicketContent {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.trim().is_empty() && self.body.trim().is_empty()
    }

    pub fn render(&self) -> String {
        let subject = self.subject.trim();
        let body = self.body.trim();
        if subject.is_empty() {
            body.to_string()
        } else {
            format!("Subject: {subject}\n\n{body}")
        }
    }
}
