//! Backend adapters: pluggable wrappers around one text-generation provider.

use crate::config::GeneratorConfig;
use crate::ProbeResult;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

/// One concrete text-generation provider.
///
/// `call_model` fully owns request execution: it either succeeds with one
/// element per requested generation (a `None` element means the provider
/// produced no output for that slot) or raises an error. It must never
/// return a short sequence to signal partial failure; retry and timeout
/// policy live inside the adapter, not in the generator.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Produces `generations` completions for one prompt.
    async fn call_model(
        &self,
        prompt: &str,
        generations: usize,
    ) -> ProbeResult<Vec<Option<String>>>;

    /// Runs before any backend call of a `generate` invocation, including
    /// no-op requests for zero generations. Side effects only.
    fn pre_generate_hook(&self) {}

    /// Transforms the assembled raw outputs. Identity by default.
    fn post_generate_hook(&self, outputs: Vec<Option<String>>) -> Vec<Option<String>> {
        outputs
    }
}

/// Adapter for OpenAI-compatible chat-completion APIs.
pub struct OpenAIBackend {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl OpenAIBackend {
    pub fn new(api_key: String, model: String, config: &GeneratorConfig) -> Self {
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(openai_config);
        Self {
            client,
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Points the adapter at a custom base URL, mainly for mock servers in
    /// tests or for self-hosted OpenAI-compatible endpoints.
    pub fn new_with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        config: &GeneratorConfig,
    ) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        let client = Client::with_config(openai_config);
        Self {
            client,
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Backend for OpenAIBackend {
    async fn call_model(
        &self,
        prompt: &str,
        generations: usize,
    ) -> ProbeResult<Vec<Option<String>>> {
        // The chat API carries `n` as a u8; a request it cannot represent
        // must fail here rather than come back short on the batch path,
        // where the caller trusts the response length.
        let n = u8::try_from(generations).map_err(|_| {
            anyhow::anyhow!(
                "requested {generations} generations in one call, but the API caps n at {}",
                u8::MAX
            )
        })?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;
        let message = ChatCompletionRequestMessage::User(user_msg);

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(vec![message])
            .n(n)
            // Saturating is fine for max_tokens: a shorter completion is
            // still a contract-compliant completion.
            .max_tokens(self.max_tokens.min(u16::MAX as u32) as u16);
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let request = args.build()?;

        let response = self.client.chat().create(request).await?;

        Ok(response
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_response(contents: &[Option<&str>]) -> serde_json::Value {
        let choices: Vec<_> = contents
            .iter()
            .enumerate()
            .map(|(i, content)| {
                json!({
                    "index": i,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                })
            })
            .collect();
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "gpt-4",
            "choices": choices,
            "usage": { "prompt_tokens": 10, "completion_tokens": 10, "total_tokens": 20 }
        })
    }

    #[tokio::test]
    async fn test_call_model_maps_choices_to_outputs() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response(&[Some("first"), Some("second")])),
            )
            .mount(&mock_server)
            .await;

        let backend = OpenAIBackend::new_with_base_url(
            "fake-key".to_string(),
            "gpt-4".to_string(),
            mock_server.uri(),
            &GeneratorConfig::default(),
        );

        let outputs = backend.call_model("prompt", 2).await.unwrap();
        assert_eq!(
            outputs,
            vec![Some("first".to_string()), Some("second".to_string())]
        );
    }

    #[tokio::test]
    async fn test_call_model_rejects_batch_beyond_api_limit() {
        // No mock mounted: the request must be refused before anything is
        // sent, never clamped to a shorter batch than asked for.
        let mock_server = MockServer::start().await;

        let backend = OpenAIBackend::new_with_base_url(
            "fake-key".to_string(),
            "gpt-4".to_string(),
            mock_server.uri(),
            &GeneratorConfig::default(),
        );

        let err = backend.call_model("prompt", 300).await.unwrap_err();
        assert!(err.to_string().contains("255"));
    }

    #[tokio::test]
    async fn test_call_model_preserves_missing_content_as_null() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(&[None])))
            .mount(&mock_server)
            .await;

        let backend = OpenAIBackend::new_with_base_url(
            "fake-key".to_string(),
            "gpt-4".to_string(),
            mock_server.uri(),
            &GeneratorConfig::default(),
        );

        let outputs = backend.call_model("prompt", 1).await.unwrap();
        assert_eq!(outputs, vec![None]);
    }
}
