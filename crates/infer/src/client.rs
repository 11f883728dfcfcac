// Gemini generateContent client
//
// API: POST {base}/v1beta/models/{model}:generateContent
// Auth: x-goog-api-key header
// One request per analysis; no retries.

use std::time::Duration;

use creditmap_config::{AIConfigStatus, ResolvedAIConfig};
use creditmap_config::settings::{DEFAULT_MAX_INPUT_CHARS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TEMPERATURE};
use creditmap_core::{Analysis, UsageMetadata};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{InferError, ServiceError};
use crate::prompt::{build_prompt, MAX_INPUT_CHARS};
use crate::response::parse_analysis;
use crate::EquivalenceInference;

const RESPONSE_MIME_TYPE: &str = "application/json";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u64>,
}

impl From<WireUsage> for UsageMetadata {
    fn from(u: WireUsage) -> Self {
        UsageMetadata {
            prompt_tokens: u.prompt_token_count,
            candidate_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Client
// ============================================================================

pub struct EquivalenceClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_input_chars: usize,
}

impl EquivalenceClient {
    /// Build a client from a resolved configuration that is ready to use.
    pub fn from_config(config: &ResolvedAIConfig) -> Result<Self, InferError> {
        if config.status != AIConfigStatus::Ready {
            return Err(InferError::NotConfigured(
                config
                    .blocking_reason
                    .clone()
                    .unwrap_or_else(|| config.status.as_str().to_string()),
            ));
        }
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| InferError::NotConfigured("API key missing".to_string()))?;

        Self::build(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.temperature,
            config.request_timeout,
            config.max_input_chars,
        )
    }

    /// Client against an explicit service root with default tuning.
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Result<Self, InferError> {
        Self::build(
            api_key,
            model,
            base_url,
            DEFAULT_TEMPERATURE,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            DEFAULT_MAX_INPUT_CHARS,
        )
    }

    fn build(
        api_key: String,
        model: String,
        base_url: String,
        temperature: f32,
        timeout: Duration,
        max_input_chars: usize,
    ) -> Result<Self, InferError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
            max_input_chars: max_input_chars.clamp(1, MAX_INPUT_CHARS),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one analysis request and validate the answer.
    pub fn infer(&self, student_text: &str, matrix_text: &str) -> Result<Analysis, InferError> {
        let prompt = build_prompt(student_text, matrix_text, self.max_input_chars);
        info!(
            "requesting equivalence analysis from {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );

        let (text, usage) = self.generate(&prompt)?;
        let parsed = parse_analysis(&text)?;

        info!(
            "model proposed {} equivalence(s){}",
            parsed.proposals.len(),
            usage
                .and_then(|u| u.total_tokens)
                .map(|t| format!(", {} tokens", t))
                .unwrap_or_default()
        );

        Ok(Analysis {
            student_name: parsed.student_name,
            proposals: parsed.proposals,
            usage,
        })
    }

    /// Raw call: returns the concatenated candidate text.
    fn generate(&self, prompt: &str) -> Result<(String, Option<UsageMetadata>), InferError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: RESPONSE_MIME_TYPE,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        debug!("generateContent returned HTTP {}", status.as_u16());

        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|b| b.error.message)
                .unwrap_or(error_text);
            if status.as_u16() == 404 {
                return Err(ServiceError::ModelUnavailable {
                    model: self.model.clone(),
                    message,
                }
                .into());
            }
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: GenerateResponse = response.json().map_err(|e| {
            InferError::malformed(format!("service response is not valid JSON: {}", e))
        })?;

        let usage = body.usage_metadata.map(UsageMetadata::from);
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(InferError::EmptyResponse);
        }
        Ok((text, usage))
    }
}

impl EquivalenceInference for EquivalenceClient {
    fn infer(&self, student_text: &str, matrix_text: &str) -> Result<Analysis, InferError> {
        EquivalenceClient::infer(self, student_text, matrix_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditmap_core::Verdict;
    use httpmock::prelude::*;

    const MODEL: &str = "gemini-2.5-pro";
    const PATH: &str = "/v1beta/models/gemini-2.5-pro:generateContent";

    fn client(server: &MockServer) -> EquivalenceClient {
        EquivalenceClient::with_base_url("test-key".into(), MODEL.into(), server.base_url()).unwrap()
    }

    fn gemini_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 1200,
                "candidatesTokenCount": 80,
                "totalTokenCount": 1280
            }
        })
    }

    const ANSWER: &str = r#"{"nome_aluno":"João","analise":[
        {"Disciplina_Origem":"Cálculo A","Disciplina_Destino":"Cálculo I","Similaridade":0.9,"Veredito":"DEFERIDO","Justificativa":"ok"},
        {"Disciplina_Origem":"Química","Disciplina_Destino":"Física I","Similaridade":0.2,"Veredito":"INDEFERIDO","Justificativa":"não"}
    ]}"#;

    #[test]
    fn successful_analysis() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(PATH)
                .header("x-goog-api-key", "test-key")
                .body_includes("\"responseMimeType\":\"application/json\"")
                .body_includes("\"temperature\":0.1")
                .body_includes("Cálculo A 60h");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(gemini_body(ANSWER));
        });

        let analysis = client(&server).infer("Cálculo A 60h", "Cálculo I 80h").unwrap();

        mock.assert();
        assert_eq!(analysis.student_name.as_deref(), Some("João"));
        assert_eq!(analysis.proposals.len(), 2);
        assert_eq!(analysis.proposals[1].verdict, Verdict::Denied);
        let usage = analysis.usage.unwrap();
        assert_eq!(usage.total_tokens, Some(1280));
        assert_eq!(usage.prompt_tokens, Some(1200));
    }

    #[test]
    fn api_key_never_in_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(PATH).query_param_missing("key");
            then.status(200).json_body(gemini_body(r#"{"analise":[]}"#));
        });
        client(&server).infer("a", "b").unwrap();
        mock.assert();
    }

    #[test]
    fn fenced_answer_accepted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200)
                .json_body(gemini_body("```json\n{\"nome_aluno\":\"A\",\"analise\":[]}\n```"));
        });
        let analysis = client(&server).infer("a", "b").unwrap();
        assert_eq!(analysis.student_name.as_deref(), Some("A"));
        assert!(analysis.proposals.is_empty());
    }

    #[test]
    fn text_split_across_parts_is_joined() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(serde_json::json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "{\"analise\":" },
                    { "text": "[]}" }
                ]}}]
            }));
        });
        let analysis = client(&server).infer("a", "b").unwrap();
        assert!(analysis.proposals.is_empty());
        assert!(analysis.usage.is_none());
    }

    #[test]
    fn not_found_names_the_model() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(404).json_body(serde_json::json!({
                "error": { "code": 404, "message": "models/gemini-2.5-pro is not found", "status": "NOT_FOUND" }
            }));
        });

        let err = client(&server).infer("a", "b").unwrap_err();
        mock.assert_calls(1);
        match err {
            InferError::Service(ServiceError::ModelUnavailable { model, message }) => {
                assert_eq!(model, MODEL);
                assert!(message.contains("is not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_error_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(500).body("upstream exploded");
        });

        let err = client(&server).infer("a", "b").unwrap_err();
        mock.assert_calls(1);
        match err {
            InferError::Service(ServiceError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            }));
        });
        let err = client(&server).infer("a", "b").unwrap_err();
        assert!(matches!(err, InferError::EmptyResponse));
    }

    #[test]
    fn prose_answer_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(gemini_body("I could not find any equivalences."));
        });
        let err = client(&server).infer("a", "b").unwrap_err();
        assert!(matches!(err, InferError::MalformedResponse(_)));
    }

    #[test]
    fn unreachable_service_is_network_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client = EquivalenceClient::with_base_url(
            "k".into(),
            MODEL.into(),
            "http://127.0.0.1:9".into(),
        )
        .unwrap();
        let err = client.infer("a", "b").unwrap_err();
        assert!(matches!(err, InferError::Service(ServiceError::Network(_))));
    }

    #[test]
    fn not_ready_config_rejected() {
        let settings = creditmap_config::AISettings {
            provider: creditmap_config::AIProvider::None,
            ..Default::default()
        };
        let config = ResolvedAIConfig::resolve(&settings, None);
        assert!(matches!(
            EquivalenceClient::from_config(&config),
            Err(InferError::NotConfigured(_))
        ));
    }

    #[test]
    fn input_budget_is_capped() {
        let settings = creditmap_config::AISettings {
            max_input_chars: 50_000,
            ..Default::default()
        };
        let config = ResolvedAIConfig::resolve(&settings, Some("k"));
        let client = EquivalenceClient::from_config(&config).unwrap();
        assert_eq!(client.max_input_chars, MAX_INPUT_CHARS);
    }

    #[test]
    fn oversized_transcript_is_cut_before_sending() {
        let server = MockServer::start();
        let head = "a".repeat(MAX_INPUT_CHARS);
        let tail = "TAILMARKER";
        let leaked = server.mock(|when, then| {
            when.method(POST).path(PATH).body_includes(tail);
            then.status(500);
        });
        let sent = server.mock(|when, then| {
            when.method(POST).path(PATH).body_includes(&head);
            then.status(200).json_body(gemini_body(r#"{"analise":[]}"#));
        });

        let settings = creditmap_config::AISettings {
            model: MODEL.into(),
            base_url: Some(server.base_url()),
            max_input_chars: 50_000,
            ..Default::default()
        };
        let config = ResolvedAIConfig::resolve(&settings, Some("k"));
        let client = EquivalenceClient::from_config(&config).unwrap();
        client.infer(&format!("{head}{tail}"), "Cálculo I").unwrap();

        sent.assert();
        leaked.assert_calls(0);
    }
}
