//! Recursive character splitting.
//!
//! Text is cut on the coarsest separator it contains (paragraph, line, word,
//! then character) and the pieces are packed back together up to
//! `chunk_size` characters. Consecutive chunks share up to `chunk_overlap`
//! trailing characters of the previous chunk, always on piece boundaries.

use std::{collections::VecDeque, path::PathBuf};

use crate::loader::Document;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A piece of a [`Document`] small enough to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source: PathBuf,
    /// Position of this chunk within its document.
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(pieces: &VecDeque<(&str, usize)>, separator: &str) -> Option<String> {
    let joined = pieces
        .iter()
        .map(|(piece, _)| *piece)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl TextSplitter {
    /// `chunk_size` is at least 1 and `chunk_overlap` is clamped below it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    /// Greedily pack pieces (each shorter than `chunk_size`) into chunks.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut out = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = |pieces_held: usize| if pieces_held == 0 { 0 } else { sep_len };

            if !current.is_empty() && total + joiner(current.len()) + len > self.chunk_size {
                if let Some(chunk) = join_trimmed(&current, separator) {
                    out.push(chunk);
                }
                // Keep a tail of at most `chunk_overlap` characters that still
                // leaves room for the incoming piece.
                while total > self.chunk_overlap
                    || (total > 0 && total + joiner(current.len()) + len > self.chunk_size)
                {
                    let Some((_, first_len)) = current.pop_front() else {
                        break;
                    };
                    total -= first_len + joiner(current.len());
                }
            }

            total += len + joiner(current.len());
            current.push_back((piece, len));
        }

        if let Some(chunk) = join_trimmed(&current, separator) {
            out.push(chunk);
        }
        out
    }
}

/// Split every document, numbering chunks per document.
pub fn split_documents(docs: &[Document], splitter: &TextSplitter) -> Vec<Chunk> {
    docs.iter()
        .flat_map(|doc| {
            splitter
                .split_text(&doc.text)
                .into_iter()
                .enumerate()
                .map(|(index, text)| Chunk {
                    source: doc.source.clone(),
                    index,
                    text,
                })
        })
        .collect()
}
