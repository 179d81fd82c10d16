//! Generates short-form promo copy (title, description, hashtags) for a
//! produced clip through an OpenAI-compatible chat completion endpoint.
//!
//! This is a side collaborator: the acquisition pipeline never depends on
//! it, and a failure here never invalidates an already produced file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// The maximum title length most short-form platforms accept.
const TITLE_LIMIT: usize = 70;

/// Promo copy for one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCopy {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    pub hashtags: Vec<String>,
}

impl fmt::Display for PromoCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.description)?;
        write!(f, "{}", self.hashtags.join(" "))
    }
}

/// A client for the chat completion endpoint that writes promo copy.
pub struct PromoWriter {
    api_key: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl PromoWriter {
    /// Creates a writer against the default OpenAI endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client could not be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            client,
        })
    }

    /// Points the writer at a compatible alternate endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the completion model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Generates promo copy for the given video, identified by title or URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when the endpoint rejects the request or
    /// answers with something that is not the expected JSON document.
    pub async fn generate(&self, subject: &str) -> Result<PromoCopy> {
        tracing::debug!(model = self.model, "requesting promo copy");

        let request = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt(subject),
            }],
            temperature: 0.8,
            max_tokens: 500,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider {
                status: Some(status.as_u16()),
                message: "Completion endpoint rejected the request".to_string(),
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(Error::Provider {
                status: None,
                message: "Completion response contained no choices".to_string(),
            })?;

        parse_copy(&content)
    }
}

fn prompt(subject: &str) -> String {
    format!(
        "Write promotional copy for a short vertical clip cut from the \
         YouTube video \"{subject}\". Answer with a single JSON object and \
         nothing else, using exactly these keys: \"titulo\" (a punchy title, \
         at most 70 characters), \"descricao\" (two engaging sentences) and \
         \"hashtags\" (an array of 5 hashtag strings)."
    )
}

/// Decodes the model's answer, tolerating prose around the JSON object.
fn parse_copy(content: &str) -> Result<PromoCopy> {
    let start = content.find('{');
    let end = content.rfind('}');

    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(Error::Provider {
                status: None,
                message: "Completion answer contained no JSON object".to_string(),
            });
        }
    };

    let mut copy: PromoCopy = serde_json::from_str(json)?;

    if copy.title.len() > TITLE_LIMIT {
        let cut = (0..=TITLE_LIMIT)
            .rev()
            .find(|index| copy.title.is_char_boundary(*index))
            .unwrap_or(0);
        copy.title.truncate(cut);
    }

    Ok(copy)
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}
