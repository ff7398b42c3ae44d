//! Code generation for pagesmith
//!
//! Turns a task brief, its validation checks, attachments and the files
//! published by earlier rounds into a named set of static web files.
//!
//! - **Chat client**: OpenAI-compatible chat completions API
//! - **Prompts**: fixed system instruction plus a composed user message
//! - **Parser**: splits the raw model output into files

pub mod error;
pub mod llm;
pub mod parser;
pub mod prompts;

pub use error::{GeneratorError, GeneratorResult};
pub use llm::{ChatClient, ChatMessage};
pub use parser::{parse_generated_files, OutputFormat};

use async_trait::async_trait;
use pagesmith_core::FileSet;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the model sees for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub brief: String,
    pub checks: Vec<String>,
    pub attachments: FileSet,
    pub existing_files: FileSet,
    pub round: u32,
}

#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Produces the files for one round. Attachments always win over
    /// generated content at the same path.
    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<FileSet>;
}

/// Configuration for the model-backed generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub output_format: OutputFormat,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: llm::client::DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.3),
            max_tokens: None,
            output_format: OutputFormat::Sections,
        }
    }
}

pub struct LlmCodeGenerator {
    client: ChatClient,
    config: GeneratorConfig,
}

impl LlmCodeGenerator {
    pub fn new(config: GeneratorConfig) -> GeneratorResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeneratorError::InvalidConfig(
                "model API key is empty".to_string(),
            ));
        }

        let client = ChatClient::new(config.api_key.clone(), config.base_url.clone());
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CodeGenerator for LlmCodeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GeneratorResult<FileSet> {
        info!(
            round = request.round,
            existing = request.existing_files.len(),
            attachments = request.attachments.len(),
            model = %self.config.model,
            "Generating files"
        );

        let messages = vec![
            ChatMessage::system(prompts::system_prompt(self.config.output_format)),
            ChatMessage::user(prompts::user_prompt(request)),
        ];

        let raw = self
            .client
            .chat_completion(
                messages,
                &self.config.model,
                self.config.temperature,
                self.config.max_tokens,
            )
            .await?;

        let mut files = parse_generated_files(&raw, self.config.output_format);
        files.overlay(&request.attachments);

        info!(round = request.round, files = files.len(), "Generated files");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GeneratorConfig {
        GeneratorConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            ..Default::default()
        }
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }]
        }))
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let result = LlmCodeGenerator::new(GeneratorConfig::default());
        assert!(matches!(result, Err(GeneratorError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_generate_parses_files_and_attachments_win() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("calculator app"))
            .respond_with(completion(
                "index.html\n<html>calc</html>\n\ndata.json\n{\"generated\": true}\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let generator = LlmCodeGenerator::new(config_for(&server)).unwrap();
        let request = GenerationRequest {
            brief: "calculator app".to_string(),
            checks: vec![],
            attachments: [("data.json", "{\"attached\": true}")].into_iter().collect(),
            existing_files: FileSet::new(),
            round: 1,
        };

        let files = generator.generate(&request).await.unwrap();

        assert_eq!(files.get("index.html"), Some("<html>calc</html>\n"));
        assert_eq!(files.get("data.json"), Some("{\"attached\": true}"));
    }

    #[tokio::test]
    async fn test_generate_sends_existing_files() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("--- index.html ---"))
            .respond_with(completion("index.html\n<html>v2</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let generator = LlmCodeGenerator::new(config_for(&server)).unwrap();
        let request = GenerationRequest {
            brief: "fix the bug".to_string(),
            checks: vec!["no errors".to_string()],
            attachments: FileSet::new(),
            existing_files: [("index.html", "<html>v1</html>")].into_iter().collect(),
            round: 2,
        };

        let files = generator.generate(&request).await.unwrap();
        assert_eq!(files.get("index.html"), Some("<html>v2</html>\n"));
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let generator = LlmCodeGenerator::new(config_for(&server)).unwrap();
        let request = GenerationRequest {
            brief: "anything".to_string(),
            checks: vec![],
            attachments: FileSet::new(),
            existing_files: FileSet::new(),
            round: 1,
        };

        let err = generator.generate(&request).await.unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Api { status_code: Some(500), .. }
        ));
    }
}
