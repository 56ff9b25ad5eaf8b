use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use shopmate_core::config::LlmConfig;
use shopmate_core::{Message, Role};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

const TEMPERATURE: f64 = 0.2;

/// Completion client for the Google Generative Language API.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("could not build llm http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest::from_messages(messages);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("completion request returned {status}: {detail}");
        }

        let payload: GenerateContentResponse =
            response.json().await.context("completion response was not valid JSON")?;
        reply_text(payload)
    }
}

fn reply_text(payload: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = payload.candidates.into_iter().next() else {
        bail!("completion response carried no candidates");
    };

    let text = candidate
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    if text.is_empty() {
        bail!("completion candidate carried no text");
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// System messages become the shared system instruction; human and
    /// assistant turns map onto the API's `user` / `model` roles.
    fn from_messages(messages: &[Message]) -> Self {
        let mut system_texts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_texts.push(message.content.clone()),
                Role::Human => contents.push(Content::with_role("user", &message.content)),
                Role::Assistant => contents.push(Content::with_role("model", &message.content)),
            }
        }

        let system_instruction =
            (!system_texts.is_empty()).then(|| Content::bare(system_texts.join("\n")));

        Self {
            contents,
            system_instruction,
            generation_config: GenerationConfig { temperature: TEMPERATURE },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn with_role(role: &'static str, text: &str) -> Self {
        Self { role: Some(role), parts: vec![Part { text: text.to_string() }] }
    }

    fn bare(text: String) -> Self {
        Self { role: None, parts: vec![Part { text }] }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use shopmate_core::Message;

    use super::{reply_text, GenerateContentRequest, GenerateContentResponse};

    #[test]
    fn request_splits_system_instruction_from_turns() {
        let request = GenerateContentRequest::from_messages(&[
            Message::system("You help store customers."),
            Message::human("hi"),
            Message::assistant("hello"),
        ]);

        let value = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "You help store customers.");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["generationConfig"]["temperature"], 0.2);
    }

    #[test]
    fn request_without_system_messages_omits_the_instruction() {
        let request = GenerateContentRequest::from_messages(&[Message::human("hi")]);
        let value = serde_json::to_value(&request).expect("serialize request");
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn reply_text_joins_candidate_parts() {
        let payload: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Sure, "}, {"text": "here."}]}}]
        }))
        .expect("deserialize payload");

        assert_eq!(reply_text(payload).expect("reply"), "Sure, here.");
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let payload: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).expect("deserialize payload");
        assert!(reply_text(payload).is_err());
    }

    #[test]
    fn candidate_without_text_is_an_error() {
        let payload: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": []}}]
        }))
        .expect("deserialize payload");
        assert!(reply_text(payload).is_err());
    }
}
