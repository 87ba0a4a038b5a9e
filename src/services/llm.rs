//! Generative-language API client.
//!
//! The chatbot only needs single-shot text generation, so the seam is one method. The
//! production implementation talks to the Gemini `generateContent` REST endpoint.

use crate::{
    config::app::ChatConfig,
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{ops::Deref, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Text generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Shared language model handle.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmHandle {
    inner: Arc<dyn LanguageModel>,
}

impl LlmHandle {
    /// Wraps a model implementation.
    pub fn new(model: impl LanguageModel) -> Self {
        Self {
            inner: Arc::new(model),
        }
    }

    /// Builds the Gemini client when an API key is configured, otherwise a disabled model.
    ///
    /// # Errors
    /// Returns `Error::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        match &config.llm_api_key {
            Some(key) => Ok(Self::new(GeminiClient::new(
                &config.llm_base_url,
                &config.llm_model,
                key,
                Duration::from_secs(config.llm_timeout_secs),
            )?)),
            None => {
                warn!("GEMINI_API_KEY not set; chatbot will answer with templated replies");
                Ok(Self::new(DisabledModel))
            }
        }
    }
}

impl Deref for LlmHandle {
    type Target = dyn LanguageModel;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

/// Model used when no API key is configured; every call fails.
pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Llm {
            message: "language model is not configured".to_string(),
        })
    }
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Creates a client for `model` at `base_url`.
    ///
    /// # Errors
    /// Returns `Error::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        info!("Gemini client ready (model: {model})");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Joins the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        debug!("Sending prompt to Gemini ({} chars)", prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Llm {
                message: format!("request failed with {status}: {body}"),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed).ok_or_else(|| Error::Llm {
            message: "response contained no text".to_string(),
        })
    }
}
