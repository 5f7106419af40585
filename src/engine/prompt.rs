//! Prompt construction for answer generation

use crate::chat::ChatMessage;
use crate::types::Chunk;

/// Render retrieved chunks as a numbered context block
fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let page = chunk
                .metadata
                .page
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!(
                "[{}] (Source: {}, Page: {})\n{}",
                i + 1,
                chunk.metadata.source,
                page,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt for a one-shot question
pub fn build_query_prompt(question: &str, chunks: &[Chunk]) -> String {
    format!(
        "You are a helpful assistant that answers questions using only the \
         provided document excerpts. If the excerpts do not contain the \
         answer, say so instead of guessing. Cite the source file name when \
         it helps.\n\n\
         Document excerpts:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        format_context(chunks),
        question
    )
}

/// Prompt for a chat turn, carrying recent conversation history
pub fn build_chat_prompt(history: &[ChatMessage], question: &str, chunks: &[Chunk]) -> String {
    let mut conversation = String::new();
    for message in history {
        conversation.push_str(&format!("{}: {}\n", message.role, message.content));
    }

    format!(
        "You are a helpful assistant in an ongoing conversation, answering \
         using only the provided document excerpts. Use the conversation to \
         resolve references in the latest question. If the excerpts do not \
         contain the answer, say so instead of guessing.\n\n\
         Document excerpts:\n{}\n\n\
         Conversation so far:\n{}\n\
         user: {}\n\n\
         assistant:",
        format_context(chunks),
        conversation,
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, source: &str, page: Option<u32>) -> Chunk {
        Chunk::new(
            content.to_string(),
            source.to_string(),
            page,
            0,
            "Title".to_string(),
        )
    }

    #[test]
    fn query_prompt_numbers_sources_and_renders_pages() {
        let chunks = vec![
            chunk("first excerpt", "a.pdf", Some(3)),
            chunk("second excerpt", "b.pdf", None),
        ];
        let prompt = build_query_prompt("what is this?", &chunks);

        assert!(prompt.contains("[1] (Source: a.pdf, Page: 3)"));
        assert!(prompt.contains("[2] (Source: b.pdf, Page: N/A)"));
        assert!(prompt.contains("Question: what is this?"));
    }

    #[test]
    fn chat_prompt_includes_history() {
        let history = vec![
            ChatMessage::user("what is CGNAT?"),
            ChatMessage::assistant("Carrier-grade NAT."),
        ];
        let prompt = build_chat_prompt(&history, "how does it scale?", &[]);

        assert!(prompt.contains("user: what is CGNAT?"));
        assert!(prompt.contains("assistant: Carrier-grade NAT."));
        assert!(prompt.contains("user: how does it scale?"));
    }
}
