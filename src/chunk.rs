//! Paragraph-boundary text chunker.
//!
//! Splits document text into passages by greedily packing blank-line
//! separated paragraphs into a buffer. When the next paragraph would bring the
//! buffer to `max_chunk_size` characters or more, the buffer is flushed and
//! the paragraph starts a new one. A paragraph is never split: one that is
//! longer than the threshold becomes an oversized chunk of its own.
//!
//! Sizes are measured in characters, not bytes.

use sha2::{Digest, Sha256};

use crate::models::{Chunk, Document};

/// Split text into paragraphs on blank lines. Paragraphs are trimmed and
/// empty ones dropped.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }

    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

/// Pack paragraphs into chunk strings, in order.
///
/// Paragraphs inside a chunk are joined by a blank line. Every chunk is
/// shorter than `max_chunk_size` unless it consists of a single paragraph
/// that is itself at least that long.
pub fn split_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    // Buffer length in chars, including the pending "\n\n" separator.
    let mut buf_len = 0usize;

    for para in split_paragraphs(text) {
        let para_len = para.chars().count();

        if !buf.is_empty() && buf_len + para_len >= max_chunk_size {
            chunks.push(buf.trim_end().to_string());
            buf.clear();
            buf_len = 0;
        }

        buf.push_str(&para);
        buf.push_str("\n\n");
        buf_len += para_len + 2;
    }

    if !buf.trim().is_empty() {
        chunks.push(buf.trim_end().to_string());
    }

    chunks
}

/// Chunk a document, dropping passages shorter than `min_chunk_chars`.
/// Surviving chunks are numbered contiguously from 0.
pub fn chunk_document(doc: &Document, max_chunk_size: usize, min_chunk_chars: usize) -> Vec<Chunk> {
    split_text(&doc.body, max_chunk_size)
        .into_iter()
        .filter(|text| text.chars().count() >= min_chunk_chars)
        .enumerate()
        .map(|(index, text)| make_chunk(doc, index, text))
        .collect()
}

fn make_chunk(doc: &Document, index: usize, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        document: doc.name.clone(),
        source_path: doc.source_path.clone(),
        chunk_index: index,
        text,
        hash,
    }
}
