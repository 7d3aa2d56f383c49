//! Ask command implementation

use crate::config::{Config, LlmConfig};
use crate::error::{Error, Result};
use crate::llm::{create_generative_model, GenerativeModel};
use crate::prompt::build_chat_request;
use crate::rank::ScoredChunk;
use crate::retrieve::RetrievalService;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct AskResult {
    pub question: String,
    pub model: String,
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
}

/// Retrieve context for a question and answer it with the generative model
pub async fn cmd_ask(config: &Config, question: &str, k: Option<usize>) -> Result<AskResult> {
    let model = create_generative_model(&config.llm)?.ok_or_else(|| {
        Error::NotConfigured(format!(
            "set {} to use the generative model",
            config.llm.api_key_env
        ))
    })?;
    let service = RetrievalService::from_config(config)?;
    answer_with(&service, model.as_ref(), &config.llm, question, k).await
}

/// Answer a question using an existing retrieval service and model
pub async fn answer_with(
    service: &RetrievalService,
    model: &dyn GenerativeModel,
    llm: &LlmConfig,
    question: &str,
    k: Option<usize>,
) -> Result<AskResult> {
    if question.trim().is_empty() {
        return Err(Error::InvalidInput("question must not be empty".to_string()));
    }

    let sources = service.retrieve_context(question, k).await;
    if sources.is_empty() {
        warn!("No legal context retrieved; answering without augmentation");
    }

    let request = build_chat_request(Vec::new(), question, &sources, llm);
    let answer = model.generate(&request).await?;
    info!(chars = answer.chars().count(), "Answer generated");

    Ok(AskResult {
        question: question.to_string(),
        model: model.model_name().to_string(),
        answer,
        sources,
    })
}

pub fn print_answer(result: &AskResult) {
    println!("\n{}\n", result.answer.trim());
    if result.sources.is_empty() {
        println!("(no legal context was retrieved)");
        return;
    }
    println!("Sources:");
    for source in &result.sources {
        println!("  • {} [score: {:.3}]", source.chunk.source, source.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::Embedder;
    use crate::expand::NullExpander;
    use crate::llm::GenerationRequest;
    use crate::retrieve::RetrievalSettings;
    use crate::store::{Chunk, VectorStore};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct ConstEmbedder;

    #[async_trait]
    impl Embedder for ConstEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> Option<usize> {
            Some(2)
        }

        fn model_name(&self) -> &str {
            "const"
        }

        fn normalizes(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerativeModel for RecordingModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(request.prompt.clone());
            }
            Ok("Theft is punishable under Section 379 IPC.".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn service(chunks: Vec<Chunk>) -> RetrievalService {
        RetrievalService::new(
            Arc::new(VectorStore::with_chunks("unused.json", chunks)),
            Arc::new(ConstEmbedder),
            Arc::new(NullExpander),
            RetrievalSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_answer_includes_retrieved_context() {
        let svc = service(vec![
            Chunk::new("Section 379. Punishment for theft.", "ipc.txt").with_embedding(vec![1.0, 0.0])
        ]);
        let model = RecordingModel::default();

        let result = answer_with(&svc, &model, &LlmConfig::default(), "What is theft?", None)
            .await
            .unwrap();

        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.model, "recording");
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Source: ipc.txt\nText: Section 379. Punishment for theft."));
    }

    #[tokio::test]
    async fn test_answer_without_context_still_generates() {
        let svc = service(Vec::new());
        let model = RecordingModel::default();

        let result = answer_with(&svc, &model, &LlmConfig::default(), "What is bail?", None)
            .await
            .unwrap();

        assert!(result.sources.is_empty());
        assert!(!result.answer.is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let svc = service(Vec::new());
        let model = RecordingModel::default();
        let err = answer_with(&svc, &model, &LlmConfig::default(), "  ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_cmd_ask_requires_api_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "LEXRAG_TEST_UNSET_ASK_KEY".to_string();
        let err = cmd_ask(&config, "What is bail?", None).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }
}
