//! Heuristic splitting of encyclopedia text into retrievable chunks.
//!
//! Entries are located by upper-case disease headings and cut further at
//! section words ("Symptoms", "Treatment", ...). When the headings yield too
//! little, mid-sized paragraphs are added so sparse documents remain
//! searchable.

use std::sync::OnceLock;

use regex::Regex;

const MIN_ENTRY_CHARS: usize = 100;
const EMIT_CHUNK_CHARS: usize = 300;
const MIN_TRAILING_CHARS: usize = 100;
const PARAGRAPH_FALLBACK_BELOW: usize = 50;
const MIN_PARAGRAPH_CHARS: usize = 200;
const MAX_PARAGRAPH_CHARS: usize = 1500;
const PARAGRAPH_DENYLIST: [&str; 4] = ["contents", "index", "volume", "chapter"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Disease heading the chunk belongs to; `None` for paragraph chunks.
    pub heading: Option<String>,
    pub content: String,
}

struct Patterns {
    heading: Regex,
    section: Regex,
    paragraph_break: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        heading: Regex::new(r"[A-Z][A-Z\s]+(?:disease|syndrome|disorder|condition|cancer|itis)")
            .expect("static regex"),
        section: Regex::new(r"(?i)\b(?:Symptoms|Causes|Treatment|Diagnosis|Prevention|Prognosis)\b")
            .expect("static regex"),
        paragraph_break: Regex::new(r"\n\s*\n").expect("static regex"),
    })
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn chunk_text(text: &str) -> Vec<TextChunk> {
    let mut chunks = chunk_by_headings(text);
    let from_headings = chunks.len();

    if from_headings < PARAGRAPH_FALLBACK_BELOW {
        tracing::info!(
            "Only {} heading chunks found; adding paragraph chunks",
            from_headings
        );
        chunks.extend(chunk_by_paragraphs(text));
    }
    chunks
}

fn chunk_by_headings(text: &str) -> Vec<TextChunk> {
    let headings: Vec<_> = patterns().heading.find_iter(text).collect();
    let mut chunks = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        let body_end = headings.get(i + 1).map_or(text.len(), |next| next.start());
        let body = &text[heading.end()..body_end];
        if char_len(body) > MIN_ENTRY_CHARS {
            chunks.extend(split_entry(heading.as_str().trim(), body));
        }
    }
    chunks
}

/// Cuts one entry at its section words. A section word closes the current
/// chunk only once that chunk is long enough; otherwise it is folded in.
fn split_entry(heading: &str, body: &str) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut current = format!("{}\n\n", heading);
    let mut cursor = 0;

    for section in patterns().section.find_iter(body) {
        let prose = &body[cursor..section.start()];
        if !prose.trim().is_empty() {
            current.push_str(prose);
        }
        cursor = section.end();

        if char_len(&current) > EMIT_CHUNK_CHARS {
            chunks.push(entry_chunk(heading, &current));
            current = format!("{} - {}\n\n", heading, section.as_str());
        } else {
            current.push_str(section.as_str());
            current.push_str("\n\n");
        }
    }

    let tail = &body[cursor..];
    if !tail.trim().is_empty() {
        current.push_str(tail);
    }
    if char_len(&current) > MIN_TRAILING_CHARS {
        chunks.push(entry_chunk(heading, &current));
    }
    chunks
}

fn entry_chunk(heading: &str, content: &str) -> TextChunk {
    TextChunk {
        heading: Some(heading.to_string()),
        content: content.trim().to_string(),
    }
}

fn chunk_by_paragraphs(text: &str) -> Vec<TextChunk> {
    patterns()
        .paragraph_break
        .split(text)
        .map(str::trim)
        .filter(|para| {
            let len = char_len(para);
            len > MIN_PARAGRAPH_CHARS && len < MAX_PARAGRAPH_CHARS
        })
        .filter(|para| {
            let lowered = para.to_lowercase();
            !PARAGRAPH_DENYLIST.iter().any(|word| lowered.contains(word))
        })
        .map(|para| TextChunk {
            heading: None,
            content: para.to_string(),
        })
        .collect()
}
