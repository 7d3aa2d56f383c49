//! Prompt construction for answering and document analysis
//!
//! Retrieved chunks are rendered into a plain-text context block and
//! combined with fixed legal-assistant instructions.

use crate::config::LlmConfig;
use crate::llm::{GenerationRequest, Message};
use crate::rank::ScoredChunk;

/// Characters of an uploaded document passed to the model
pub const MAX_DOCUMENT_CHARS: usize = 10_000;

pub const LEGAL_ASSISTANT_INSTRUCTION: &str = "You are an AI legal assistant specialized in Indian law.
Your role is to explain legal concepts clearly and cautiously.
You must not provide definitive legal judgments.
You must base your answer strictly on the provided legal context.
If the context is insufficient, say so explicitly.
Use simple language suitable for a non-lawyer.";

pub const DOCUMENT_ANALYSIS_INSTRUCTION: &str = "You are an AI assistant analyzing Indian legal documents.
Your task is to identify potential risks, missing clauses, and unclear obligations.
You must rely only on the provided document text and legal context.";

const ANSWER_GUIDELINES: &str = "Instructions:
- Explain the applicable law in simple terms.
- Clarify possible interpretations.
- Highlight risks and limitations.
- Suggest next steps cautiously.
- Do NOT fabricate laws or sections.
";

const ANALYSIS_GUIDELINES: &str = "Instructions:
- Identify risky or ambiguous clauses.
- Mention which laws or standards they relate to.
- Explain risks in simple language.
- Avoid giving legal verdicts.";

/// Render retrieved chunks as `Source:`/`Text:` blocks
pub fn format_context_block(context: &[ScoredChunk]) -> String {
    context
        .iter()
        .map(|scored| {
            let source = if scored.chunk.source.is_empty() {
                "Unknown"
            } else {
                scored.chunk.source.as_str()
            };
            format!("Source: {}\nText: {}", source, scored.chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Build the answer request for the latest question in a conversation
pub fn build_chat_request(
    history: Vec<Message>,
    question: &str,
    context: &[ScoredChunk],
    llm: &LlmConfig,
) -> GenerationRequest {
    let prompt = format!(
        "{}\n\nUser Query:\n{}\n\nRelevant Legal Context:\n{}\n\n{}",
        LEGAL_ASSISTANT_INSTRUCTION,
        question,
        format_context_block(context),
        ANSWER_GUIDELINES
    );

    GenerationRequest::new(prompt)
        .with_system_instruction(LEGAL_ASSISTANT_INSTRUCTION)
        .with_history(history)
        .with_sampling(llm.temperature, llm.max_output_tokens)
}

/// Build the risk-analysis request for a document's extracted text
pub fn build_analysis_request(document_text: &str, context: &[ScoredChunk]) -> GenerationRequest {
    let prompt = format!(
        "{}\n\nDocument Text:\n{}\n\nRelevant Legal References:\n{}\n\n{}",
        DOCUMENT_ANALYSIS_INSTRUCTION,
        truncate_chars(document_text, MAX_DOCUMENT_CHARS),
        format_context_block(context),
        ANALYSIS_GUIDELINES
    );

    GenerationRequest::new(prompt)
}
