//! HTML email templates for application notifications.

use crate::domain::ApplicationStatus;
use crate::domain::ports::{OutboundEmail, PetSummary, UserContact};

const SIGNATURE: &str = "<p>Thank you,<br/>The PetStore Team</p>";

/// Values shared by both templates.
pub(super) struct TemplateContext<'a> {
    pub user: &'a UserContact,
    pub pet: &'a PetSummary,
    pub application_id: &'a str,
}

impl TemplateContext<'_> {
    fn greeting(&self) -> String {
        let name = self
            .user
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("there");
        format!("<p>Dear {},</p>", escape_html(name))
    }

    fn pet_name(&self) -> String {
        escape_html(&self.pet.name)
    }
}

pub(super) fn application_received(
    context: &TemplateContext<'_>,
    status: ApplicationStatus,
) -> OutboundEmail {
    let subject = format!(
        "Adoption Application Received for {} (ID: {})",
        context.pet.name, context.application_id
    );
    let mut body = String::from("<h1>Adoption Application Received!</h1>");
    body.push_str(&context.greeting());
    body.push_str(&format!(
        "<p>Thank you for submitting your adoption application (ID: {}) for <strong>{}</strong> (Pet ID: {}).</p>",
        escape_html(context.application_id),
        context.pet_name(),
        escape_html(context.pet.id.as_str()),
    ));
    body.push_str(&format!(
        "<p>Your application is currently in status: <strong>{status}</strong>.</p>"
    ));
    body.push_str("<p>We will review your application and get back to you soon.</p>");
    body.push_str(SIGNATURE);

    OutboundEmail {
        to: context.user.email.clone(),
        subject,
        html_body: body,
    }
}

pub(super) fn status_updated(
    context: &TemplateContext<'_>,
    status: ApplicationStatus,
    review_notes: &str,
) -> OutboundEmail {
    let subject = format!(
        "Update on Your Adoption Application for {} (ID: {})",
        context.pet.name, context.application_id
    );
    let mut body = String::from("<h1>Adoption Application Status Update!</h1>");
    body.push_str(&context.greeting());
    body.push_str(&format!(
        "<p>There's an update on your adoption application (ID: {}) for <strong>{}</strong> (Pet ID: {}).</p>",
        escape_html(context.application_id),
        context.pet_name(),
        escape_html(context.pet.id.as_str()),
    ));
    body.push_str(&format!(
        "<p>Your application status is now: <strong>{status}</strong>.</p>"
    ));
    if !review_notes.is_empty() {
        body.push_str(&format!("<p>Reviewer's Notes: {}</p>", escape_html(review_notes)));
    }
    body.push_str(status_copy(status));
    body.push_str(SIGNATURE);

    OutboundEmail {
        to: context.user.email.clone(),
        subject,
        html_body: body,
    }
}

fn status_copy(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Approved => {
            "<p>Congratulations! Your application has been approved. We will contact you shortly with the next steps.</p>"
        }
        ApplicationStatus::Rejected => {
            "<p>We regret to inform you that your application was not approved at this time. Thank you for your interest.</p>"
        }
        _ => "<p>We will let you know as soon as there is further news.</p>",
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
