use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::LlmConfig;

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.2;
const STOP: &[&str] = &["\n."];
const RECRUITER_PERSONA: &str =
    "You are a tech recruiter who has reviewed thousands of resume and coverletter";

#[async_trait]
pub trait CoverLetterWriter: Send + Sync {
    async fn generate_cover_letter(&self, job_desc: &str, resume_text: &str)
        -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Conversation asking for a cover letter. Without a job description the
/// model gets a single generic request.
pub fn cover_letter_messages(job_desc: &str, resume_text: &str) -> Vec<ChatMessage> {
    let system = ChatMessage::new("system", RECRUITER_PERSONA);
    if job_desc.trim().is_empty() {
        return vec![
            system,
            ChatMessage::new(
                "user",
                format!("Can you create a cover letter for my resume?\nResume:\n{resume_text}"),
            ),
        ];
    }
    vec![
        system,
        ChatMessage::new(
            "user",
            format!(
                "I want to apply for this job:\nJob desc:\n{job_desc}\n can you help me write a coverletter for this?"
            ),
        ),
        ChatMessage::new("assistant", "Ok, can you share your resume with me?"),
        ChatMessage::new(
            "user",
            format!("Yes, here is the text content of resume:\n {resume_text}"),
        ),
    ]
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    stop: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI chat-completions client. One attempt per call.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build llm http client")?;
        Ok(Self {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
            stop: STOP,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl CoverLetterWriter for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, job_desc_len = job_desc.len(), resume_len = resume_text.len()))]
    async fn generate_cover_letter(
        &self,
        job_desc: &str,
        resume_text: &str,
    ) -> anyhow::Result<String> {
        let letter = self
            .chat(cover_letter_messages(job_desc, resume_text))
            .await
            .context("generate cover letter")?;
        debug!(len = letter.len(), "cover letter generated");
        Ok(letter)
    }
}
