use crate::rag::StoredChunk;

const MIN_LINE_CHARS: usize = 20;
const NOISE_MARKER: &str = "contents";

/// Joins retrieved chunks into the context handed to the model, dropping
/// short lines and table-of-contents residue. Cut at `max_chars` characters.
pub fn build_context(chunks: &[StoredChunk], max_chars: usize) -> String {
    let cleaned: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            chunk
                .content
                .lines()
                .map(str::trim)
                .filter(|line| {
                    line.chars().count() > MIN_LINE_CHARS
                        && !line.to_lowercase().contains(NOISE_MARKER)
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|text| !text.is_empty())
        .collect();

    cleaned.join("\n\n").chars().take(max_chars).collect()
}

pub fn render_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a medical assistant. Use the provided medical information to answer the question clearly and concisely.

MEDICAL INFORMATION:
{context}

QUESTION: {question}

Please provide:
1. A clear, direct answer to the question
2. Key points in simple language
3. Important safety information
4. Reference that this is from a medical encyclopedia

Keep the response under 300 words and very easy to understand."
    )
}
