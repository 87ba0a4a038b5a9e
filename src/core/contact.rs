//! Contact form submissions.

use crate::{
    entities::contact_message,
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Contact form fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    /// Sender name.
    pub name: String,
    /// Reply address.
    pub email: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

/// Loose email shape check: something before `@`, a dot inside the domain.
#[must_use]
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Stores a contact message.
///
/// # Errors
/// Returns `Error::Validation` for an empty field or a malformed email.
pub async fn submit_contact(db: &DatabaseConnection, input: ContactInput) -> Result<contact_message::Model> {
    let fields = [
        ("name", input.name.trim()),
        ("email", input.email.trim()),
        ("subject", input.subject.trim()),
        ("message", input.message.trim()),
    ];
    if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
        return Err(Error::validation(format!("The {field} field is required")));
    }
    let email = input.email.trim();
    if !looks_like_email(email) {
        return Err(Error::validation("Please provide a valid email address"));
    }

    let saved = contact_message::ActiveModel {
        name: Set(input.name.trim().to_string()),
        email: Set(email.to_string()),
        subject: Set(input.subject.trim().to_string()),
        message: Set(input.message.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Contact message {} received", saved.id);
    Ok(saved)
}
