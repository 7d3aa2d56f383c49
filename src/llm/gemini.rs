use super::{GenerationRequest, GenerativeModel, Role};
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let mut endpoint =
            Url::parse(&base)?.join(&format!("models/{}:generateContent", config.model))?;
        endpoint.query_pairs_mut().append_pair("key", &api_key);

        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    let mut contents: Vec<Content<'_>> = request
        .history
        .iter()
        .map(|message| Content {
            role: Some(wire_role(message.role)),
            parts: vec![Part {
                text: &message.content,
            }],
        })
        .collect();
    contents.push(Content {
        role: Some("user"),
        parts: vec![Part {
            text: &request.prompt,
        }],
    });

    let generation_config = if request.temperature.is_some() || request.max_output_tokens.is_some() {
        Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        })
    } else {
        None
    };

    GenerateContentRequest {
        system_instruction: request.system_instruction.as_deref().map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        contents,
        generation_config,
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(model = %self.model, turns = request.history.len() + 1, "Calling generative model");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Generation(format!(
                "Gemini returned {}: {}",
                status,
                text.trim()
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("failed to parse response: {}", e.without_url())))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Generation("empty response from model".to_string()));
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            base_url: format!("{}/v1beta", server.uri()),
            model: "gemini-pro".to_string(),
            ..Default::default()
        }
    }

    fn reply(parts: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": parts } }]
        }))
    }

    #[test]
    fn test_body_maps_roles_and_settings() {
        let request = GenerationRequest::new("And the punishment?")
            .with_system_instruction("You are a legal assistant.")
            .with_history(vec![
                Message::user("What is Section 379?"),
                Message::assistant("Theft."),
            ])
            .with_sampling(0.7, 4096);

        let value = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "You are a legal assistant."
        );
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][2]["role"], "user");
        assert_eq!(value["contents"][2]["parts"][0]["text"], "And the punishment?");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_body_omits_unset_fields() {
        let value = serde_json::to_value(build_body(&GenerationRequest::new("q"))).unwrap();
        assert!(value.get("systemInstruction").is_none());
        assert!(value.get("generationConfig").is_none());
        assert_eq!(value["contents"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }]
            })))
            .respond_with(reply(serde_json::json!([{ "text": "Section 279, " }, { "text": "rash driving" }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "test-key".to_string()).unwrap();
        let text = client.generate(&GenerationRequest::new("hello")).await.unwrap();
        assert_eq!(text, "Section 279, rash driving");
    }

    #[tokio::test]
    async fn test_generate_empty_candidates_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "k".to_string()).unwrap();
        let err = client.generate(&GenerationRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_generate_http_error_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "bad".to_string()).unwrap();
        let err = client.generate(&GenerationRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, Error::Generation(ref msg) if msg.contains("403")));
    }
}
