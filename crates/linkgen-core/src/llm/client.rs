//! LLM client: typed request layer over an OpenAI-chat-completions-shaped
//! HTTP endpoint, wired through the retry executor.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;

use super::parsing::{self, DraftsResponse};
use super::retry::{execute_with_retry, Attempt, RetryConfig};

/// Output of `GenerateDrafts`.
pub struct DraftsResult {
    pub posts: Vec<String>,
    pub articles: Vec<String>,
    pub prompt: String,
    pub raw_response: String,
}

/// A typed client over an OpenAI-compatible chat-completions endpoint.
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryConfig,
}

impl LlmClient {
    /// Construct a client. `base_url`'s trailing `/` is trimmed; it must be
    /// `http(s)`. `timeout` must be greater than zero.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout: std::time::Duration,
        retry: RetryConfig,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LlmError::InvalidRequest(format!(
                "base_url must be http(s): {base_url}"
            )));
        }
        if timeout.is_zero() {
            return Err(LlmError::InvalidRequest("timeout must be greater than zero".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Request)?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
            retry,
        })
    }

    /// Low-level escape hatch: send a single prompt, apply the retry
    /// policy, and return the raw completion text.
    pub async fn send_request(&self, cancel: &CancellationToken, prompt: &str) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidRequest("prompt must not be empty".to_string()));
        }

        execute_with_retry(&self.retry, cancel, || self.attempt(prompt)).await
    }

    async fn attempt(&self, prompt: &str) -> Attempt<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut builder = self.http.post(format!("{}/v1/chat/completions", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = match builder.json(&request).send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Transport(LlmError::Request(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Attempt::Status {
                status: code,
                error: LlmError::Api { status: code, message },
            };
        }

        let body: ChatCompletionResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => return Attempt::Transport(LlmError::Request(e)),
        };

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let text = text.trim().to_string();

        if text.is_empty() {
            return Attempt::Status {
                status: 0,
                error: LlmError::EmptyResponse,
            };
        }

        Attempt::Success(text)
    }

    /// Generate `count` standalone ideas for a topic.
    pub async fn generate_ideas(
        &self,
        cancel: &CancellationToken,
        topic: &str,
        count: u32,
    ) -> Result<Vec<String>, LlmError> {
        if topic.trim().is_empty() {
            return Err(LlmError::InvalidRequest("topic must not be empty".to_string()));
        }
        if count == 0 {
            return Err(LlmError::InvalidRequest("count must be greater than zero".to_string()));
        }

        let prompt = format!(
            "Generate {count} short, concrete content ideas about \"{topic}\". \
             Respond with JSON only: {{\"ideas\": [\"...\"]}}."
        );
        let raw = self.send_request(cancel, &prompt).await?;
        let parsed = parsing::parse_ideas_response(&raw).map_err(|e| annotate_prompt(e, &prompt))?;
        Ok(parsed.ideas)
    }

    /// Generate five post drafts and one article draft from an idea.
    pub async fn generate_drafts(
        &self,
        cancel: &CancellationToken,
        idea: &str,
        user_context: &str,
    ) -> Result<DraftsResult, LlmError> {
        if idea.trim().is_empty() {
            return Err(LlmError::InvalidRequest("idea must not be empty".to_string()));
        }
        if user_context.trim().is_empty() {
            return Err(LlmError::InvalidRequest("user_context must not be empty".to_string()));
        }

        let prompt = format!(
            "Idea: {idea}\n\nAuthor context:\n{user_context}\n\n\
             Write 5 short social posts and 1 long-form article derived from this idea. \
             Respond with JSON only: {{\"posts\": [\"...\", ...], \"articles\": [\"...\"]}}."
        );
        let raw = self.send_request(cancel, &prompt).await?;
        let DraftsResponse { posts, articles } =
            parsing::parse_drafts_response(&raw).map_err(|e| annotate_prompt(e, &prompt))?;
        Ok(DraftsResult {
            posts,
            articles,
            prompt,
            raw_response: raw,
        })
    }

    /// Refine a draft given the user's refinement instruction and its prior
    /// refinement history (most recent last).
    pub async fn refine_draft(
        &self,
        cancel: &CancellationToken,
        current_content: &str,
        user_prompt: &str,
        history: &[String],
    ) -> Result<String, LlmError> {
        if user_prompt.trim().is_empty() {
            return Err(LlmError::InvalidRequest("user_prompt must not be empty".to_string()));
        }

        let history_block = if history.is_empty() {
            String::new()
        } else {
            format!("\n\nPrior revisions:\n{}", history.join("\n---\n"))
        };

        let prompt = format!(
            "Current draft:\n{current_content}{history_block}\n\n\
             Apply this revision instruction and return only the revised draft text:\n{user_prompt}"
        );
        self.send_request(cancel, &prompt).await
    }
}

fn annotate_prompt(err: LlmError, prompt: &str) -> LlmError {
    match err {
        LlmError::ResponseError { stage, raw_response, detail, .. } => LlmError::ResponseError {
            stage,
            prompt: prompt.to_string(),
            raw_response,
            detail,
        },
        other => other,
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: String) -> LlmClient {
        LlmClient::new(
            &base_url,
            Some("test-key".to_string()),
            "gpt-4o-mini".to_string(),
            0.7,
            512,
            std::time::Duration::from_secs(5),
            RetryConfig { max_retries: 1, ..RetryConfig::default() },
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = LlmClient::new(
            "ftp://example.com",
            None,
            "m".to_string(),
            0.5,
            100,
            std::time::Duration::from_secs(1),
            RetryConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = LlmClient::new(
            "http://example.com",
            None,
            "m".to_string(),
            0.5,
            100,
            std::time::Duration::ZERO,
            RetryConfig::default(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn generate_ideas_happy_path() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ideas\":[\"a\",\"b\",\"c\",\"d\",\"e\"]}"}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let cancel = CancellationToken::new();
        let ideas = client.generate_ideas(&cancel, "Rust async", 5).await.unwrap();
        assert_eq!(ideas.len(), 5);
    }

    #[tokio::test]
    async fn generate_ideas_rejects_empty_topic() {
        let client = client_for("http://localhost:1".to_string());
        let cancel = CancellationToken::new();
        let result = client.generate_ideas(&cancel, "  ", 5).await;
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn generate_drafts_strips_markdown_fence() {
        let server = MockServer::start().await;
        let content = "```json\n{\"posts\":[\"p1\",\"p2\",\"p3\",\"p4\",\"p5\"],\"articles\":[\"# Title\\n\\nBody\"]}\n```";
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let cancel = CancellationToken::new();
        let result = client.generate_drafts(&cancel, "an idea", "General professional content").await.unwrap();
        assert_eq!(result.posts.len(), 5);
        assert_eq!(result.articles.len(), 1);
    }

    #[tokio::test]
    async fn retries_on_500_then_succeeds() {
        let server = MockServer::start().await;
        let success_body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ideas\":[\"a\"]}"}}]
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&success_body))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let cancel = CancellationToken::new();
        let ideas = client.generate_ideas(&cancel, "topic", 1).await.unwrap();
        assert_eq!(ideas, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn non_retryable_400_returns_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "bad request"}
            })))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let cancel = CancellationToken::new();
        let err = client.send_request(&cancel, "hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
    }
}
