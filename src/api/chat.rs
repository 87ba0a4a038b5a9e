//! Chatbot and contact form endpoints.

use crate::{
    api::{error::ApiJson, state::SharedState},
    core::{
        chat::{self, ChatReply},
        contact::{self, ContactInput},
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Message typed by the user.
    pub message: String,
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<SharedState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatReply>> {
    let reply = chat::respond(
        &state.db,
        &state.cache,
        &state.llm,
        state.chat_ttl(),
        &request.message,
    )
    .await?;
    Ok(Json(reply))
}

/// `POST /api/contact`
pub async fn contact(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<ContactInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let saved = contact::submit_contact(&state.db, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": saved.id, "message": "Thanks for reaching out! We'll get back to you soon." })),
    ))
}
