// src/emotion/chunker.rs

//! Sentence-aware chunking for classifier input sizing.
//!
//! Long inputs are split on sentence boundaries and greedily packed into
//! chunks bounded by a maximum length, so the classifier sees stable input
//! sizes regardless of how much text a caller submits.

/// Split `text` into sentence-respecting chunks of at most `max_len` bytes.
///
/// Pure function. Never returns an empty sequence: when splitting yields
/// nothing the trimmed input comes back as a single chunk, and a single
/// sentence longer than `max_len` is emitted whole rather than split
/// mid-sentence.
pub fn split(text: &str, max_len: usize) -> Vec<String> {
    let trimmed = text.trim();

    let mut chunks = Vec::new();
    let mut buf = String::new();

    for sentence in split_sentences(trimmed) {
        if buf.is_empty() {
            buf = sentence;
        } else if buf.len() + sentence.len() + 1 <= max_len {
            buf.push(' ');
            buf.push_str(&sentence);
        } else {
            chunks.push(std::mem::take(&mut buf));
            buf = sentence;
        }
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }

    if chunks.is_empty() {
        chunks.push(trimmed.to_string());
    }
    chunks
}

/// Split on sentence-ending punctuation followed by whitespace (or end of
/// input), and on newlines. Punctuation stays with its sentence. A '.' with a
/// non-whitespace successor is not a boundary, so decimals and abbreviations
/// survive intact.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            flush(&mut sentences, &mut current);
            continue;
        }

        current.push(ch);

        if matches!(ch, '.' | '!' | '?') {
            let at_boundary = chars.peek().map(|c| c.is_whitespace()).unwrap_or(true);
            if at_boundary {
                flush(&mut sentences, &mut current);
            }
        }
    }
    flush(&mut sentences, &mut current);

    sentences
}

fn flush(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}
