//! Minimal client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;
use ureq::Agent;

use crate::config::LabConfig;
use crate::error::ExecError;

/// Model endpoint settings. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LlmClient {
    api_key: Option<String>,
    model: String,
    api_base: String,
    temperature: f32,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let defaults = LabConfig::default();
        Self {
            api_key,
            model: model.into(),
            api_base: defaults.api_base,
            temperature: defaults.temperature,
            timeout: defaults.request_timeout,
        }
    }

    pub fn from_config(config: &LabConfig) -> Self {
        Self {
            api_key: config.google_api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            temperature: config.temperature,
            timeout: config.request_timeout,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start building a request.
    pub fn request(&self) -> LlmRequest<'_> {
        LlmRequest {
            client: self,
            system: None,
            user: Vec::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

/// A single system + user exchange, sent with [`LlmRequest::send`].
pub struct LlmRequest<'a> {
    client: &'a LlmClient,
    system: Option<String>,
    user: Vec<String>,
}

impl LlmRequest<'_> {
    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.system = Some(text.into());
        self
    }

    /// Append a user message. Multiple calls are joined with blank lines.
    pub fn user(mut self, text: impl Into<String>) -> Self {
        self.user.push(text.into());
        self
    }

    pub fn body(&self) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": self.user.join("\n\n") }],
            }],
            "generationConfig": { "temperature": self.client.temperature },
        });
        if let Some(system) = &self.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }

    pub fn send(self) -> Result<String, ExecError> {
        let key = self
            .client
            .api_key
            .as_deref()
            .ok_or_else(|| ExecError::auth("GOOGLE_API_KEY is not set"))?;

        let config = Agent::config_builder()
            .timeout_global(Some(self.client.timeout))
            .build();
        let agent: Agent = config.into();

        debug!(model = %self.client.model, "sending generateContent request");
        let response: Value = agent
            .post(&self.client.endpoint())
            .header("x-goog-api-key", key)
            .send_json(self.body())?
            .body_mut()
            .read_json()?;

        extract_text(&response)
    }
}

/// Pull the answer text out of a `generateContent` response.
pub fn extract_text(response: &Value) -> Result<String, ExecError> {
    if let Some(reason) = response
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(ExecError::malformed(format!("prompt blocked: {reason}")));
    }

    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| ExecError::malformed("response has no candidate content"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(ExecError::malformed("model returned an empty answer"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn body_carries_system_user_and_temperature() {
        let client = LlmClient::new(Some("k".into()), "gemini-pro");
        let body = client
            .request()
            .system("be brief")
            .user("first")
            .user("second")
            .body();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "first\n\nsecond");
        assert!(body["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn body_without_system_instruction() {
        let client = LlmClient::new(None, "gemini-pro");
        let body = client.request().user("hi").body();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn endpoint_uses_model_and_trims_slash() {
        let client = LlmClient::new(None, "gemini-pro").with_api_base("http://localhost:9/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn send_without_key_is_auth_error() {
        let client = LlmClient::new(None, "gemini-pro");
        let err = client.request().user("hi").send().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Auth);
    }

    #[test]
    fn send_to_unreachable_host_is_network_error() {
        let client = LlmClient::new(Some("k".into()), "gemini-pro")
            .with_api_base("http://localhost:1")
            .with_timeout(Duration::from_secs(5));
        let err = client.request().user("hi").send().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
    }

    // --- extract_text ---

    #[test]
    fn extract_joins_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello, " }, { "text": "lab" }] } }]
        });
        assert_eq!(extract_text(&response).unwrap(), "Hello, lab");
    }

    #[test]
    fn extract_reports_block_reason() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_text(&response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn extract_rejects_missing_or_empty_content() {
        assert!(matches!(
            extract_text(&json!({})),
            Err(ExecError::MalformedOutput(_))
        ));
        let empty = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] });
        assert!(matches!(
            extract_text(&empty),
            Err(ExecError::MalformedOutput(_))
        ));
    }
}
