//! Request identity.
//!
//! Authentication is delegated to the hosted identity provider sitting in front of the
//! API. It forwards the verified subject in a configurable header (`x-user-id` by
//! default); these extractors read that header and load the local user record.

use crate::{
    api::state::SharedState,
    core::user as users,
    entities::user,
    errors::{Error, Result},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

fn subject_of(parts: &Parts, state: &SharedState) -> Option<String> {
    parts
        .headers
        .get(state.config.auth.user_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Authenticated subject, whether or not a local user record exists yet.
#[derive(Debug, Clone)]
pub struct AuthSubject(pub String);

#[async_trait]
impl FromRequestParts<SharedState> for AuthSubject {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self> {
        subject_of(parts, state).map(Self).ok_or(Error::Unauthorized)
    }
}

/// Authenticated user with a synced local record.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[async_trait]
impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self> {
        let subject = subject_of(parts, state).ok_or(Error::Unauthorized)?;
        match users::get_user(&state.db, &subject).await? {
            Some(found) => Ok(Self(found)),
            None => {
                debug!("Subject {subject} has not synced a profile yet");
                Err(Error::Unauthorized)
            }
        }
    }
}

/// Authenticated user with the instructor or admin role. Rejects other users with 403
/// before the request body is read.
#[derive(Debug, Clone)]
pub struct Instructor(pub user::Model);

#[async_trait]
impl FromRequestParts<SharedState> for Instructor {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self> {
        let CurrentUser(me) = CurrentUser::from_request_parts(parts, state).await?;
        if users::can_teach(&me) {
            Ok(Self(me))
        } else {
            Err(Error::forbidden("Instructor access required"))
        }
    }
}

/// The current user when the request is authenticated, for endpoints open to everyone.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<user::Model>);

#[async_trait]
impl FromRequestParts<SharedState> for OptionalUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self> {
        let Some(subject) = subject_of(parts, state) else {
            return Ok(Self(None));
        };
        Ok(Self(users::get_user(&state.db, &subject).await?))
    }
}
