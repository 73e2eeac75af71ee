use axum::{extract::State, response::Redirect};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::form::AppForm;
use crate::mail::OutgoingMail;
use crate::state::AppState;
use crate::utils::flash::{self, Flash};

/// Visitor message from the contact page.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ContactForm {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub message: String,
}

impl ContactForm {
    fn validate(&self) -> Result<(), AppError> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(AppError::Validation("Name must be 1-100 characters".into()));
        }
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed || email.len() > 254 || email.contains(char::is_whitespace) {
            return Err(AppError::Validation("A valid email address is required".into()));
        }
        let message = self.message.trim();
        if message.is_empty() || message.chars().count() > 5000 {
            return Err(AppError::Validation("Message must be 1-5000 characters".into()));
        }
        Ok(())
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Contact",
    operation_id = "sendContactMessage",
    summary = "Send a message to the site owner",
    description = "Emails the message and redirects back to `/contact` with a flash saying whether it was sent.",
    request_body(content = ContactForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to `/contact`"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, form), fields(email = %form.email))]
pub async fn send_message(
    State(state): State<AppState>,
    jar: CookieJar,
    AppForm(form): AppForm<ContactForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    form.validate()?;

    let mail = OutgoingMail::contact(form.name.trim(), form.email.trim(), form.message.trim());
    let message = match state.mailer.send(&mail).await {
        Ok(()) => {
            info!("Contact message sent");
            Flash::success("Thank you for your message. I'll get back to you soon!")
        }
        Err(e) => {
            error!(error = %e, "Failed to send contact message");
            Flash::error("Sorry, your message could not be sent. Please try again later.")
        }
    };

    Ok((flash::push(jar, [message]), Redirect::to("/contact")))
}
