//! Ollama provider implementing [`GenerationProvider`].
//!
//! Talks to the Ollama `/api/generate` endpoint:
//! - Streaming mode yields the `response` field of each NDJSON line until a
//!   line carries `"done": true`
//! - JSON mode (`"format": "json"`) requests a single complete JSON object

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::errors::{LlmError, Result, TokenStream};
use crate::lines::parse_json_lines;
use crate::provider::GenerationProvider;

/// Configuration for [`OllamaProvider`].
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// Ollama generation provider.
pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new provider.
    #[must_use]
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: OllamaConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn request_body(
        &self,
        prompt: &str,
        system: Option<&str>,
        streaming: bool,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": streaming,
        });
        if let Some(system) = system {
            body["system"] = serde_json::Value::String(system.to_string());
        }
        if !streaming {
            body["format"] = serde_json::Value::String("json".to_string());
        }
        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}/api/generate", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    async fn generate_stream(&self, prompt: &str, system: Option<&str>) -> Result<TokenStream> {
        let body = self.request_body(prompt, system, true);
        let response = self.send(&body).await?;
        let byte_stream = response.bytes_stream();

        let token_stream = stream! {
            let mut lines = std::pin::pin!(parse_json_lines(byte_stream));
            while let Some(line) = lines.next().await {
                match serde_json::from_str::<GenerateLine>(&line) {
                    Ok(parsed) => {
                        if !parsed.response.is_empty() {
                            yield Ok(parsed.response);
                        }
                        if parsed.done {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(LlmError::Stream {
                            message: format!("unparseable stream line: {e}"),
                        });
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(token_stream))
    }

    async fn generate_json(&self, prompt: &str, system: Option<&str>) -> Result<serde_json::Value> {
        let body = self.request_body(prompt, system, false);
        let response = self.send(&body).await?;

        let envelope: serde_json::Value = response.json().await?;
        let inner = envelope
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        debug!(len = inner.len(), "received JSON-mode response");
        let value: serde_json::Value = serde_json::from_str(inner)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String) -> OllamaProvider {
        OllamaProvider::new(OllamaConfig {
            base_url,
            model: "llama3.2".into(),
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn streams_response_fragments() {
        let server = MockServer::start().await;
        let ndjson = concat!(
            "{\"response\":\"Voc\u{ea} \",\"done\":false}\n",
            "{\"response\":\"gastou \",\"done\":false}\n",
            "{\"response\":\"R$ 50,00\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
            .mount(&server)
            .await;

        let stream = provider(server.uri())
            .generate_stream("quanto gastei?", Some("system"))
            .await
            .unwrap();
        let tokens: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(tokens, vec!["Você ", "gastou ", "R$ 50,00"]);
    }

    #[tokio::test]
    async fn stream_stops_at_done() {
        let server = MockServer::start().await;
        let ndjson = concat!(
            "{\"response\":\"a\",\"done\":false}\n",
            "{\"response\":\"b\",\"done\":true}\n",
            "{\"response\":\"never\",\"done\":false}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
            .mount(&server)
            .await;

        let stream = provider(server.uri()).generate_stream("p", None).await.unwrap();
        let tokens: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn api_error_status_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .generate_stream("p", None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn unparseable_line_yields_stream_error() {
        let server = MockServer::start().await;
        let ndjson = "{\"response\":\"ok\",\"done\":false}\nnot json at all\n";
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
            .mount(&server)
            .await;

        let stream = provider(server.uri()).generate_stream("p", None).await.unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn generate_json_parses_inner_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({"stream": false, "format": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "{\"creates\": true, \"name\": \"Mercado\"}",
                "done": true
            })))
            .mount(&server)
            .await;

        let value = provider(server.uri())
            .generate_json("classify this", Some("system"))
            .await
            .unwrap();
        assert_eq!(value["creates"], true);
        assert_eq!(value["name"], "Mercado");
    }

    #[tokio::test]
    async fn generate_json_malformed_inner_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "definitely not json",
                "done": true
            })))
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .generate_json("classify", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Json(_)));
    }
}
