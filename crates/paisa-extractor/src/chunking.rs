//! Line-respecting chunking for oversized statements
//!
//! Content is split into chunks whose estimated token count stays within
//! the per-call budget after reserving a margin for prompt scaffolding and
//! the expected response. Chunk boundaries never split a line, except when
//! a single line alone exceeds the budget; such a line is hard-split into
//! fixed-size pieces. Joining the chunk texts with newlines reproduces the
//! content's characters exactly (newline placement aside for hard splits).

use crate::tokens::estimate_tokens;

/// A bounded slice of statement text, numbered for prompts and logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the chunk sequence
    pub index: usize,
    /// Total number of chunks produced from the content
    pub total: usize,
    /// The chunk text
    pub text: String,
}

/// Splits content into token-budgeted, line-respecting chunks
#[derive(Debug, Clone, Copy)]
pub struct ContentChunker {
    max_tokens_per_chunk: usize,
    reserved_tokens: usize,
}

impl ContentChunker {
    /// Create a chunker with the given token budget and reserved margin
    pub fn new(max_tokens_per_chunk: usize, reserved_tokens: usize) -> Self {
        Self {
            max_tokens_per_chunk,
            reserved_tokens,
        }
    }

    /// Effective character budget per chunk (1 token ~ 4 characters)
    pub fn char_budget(&self) -> usize {
        self.max_tokens_per_chunk
            .saturating_sub(self.reserved_tokens)
            .saturating_mul(4)
            .max(1)
    }

    /// Lazily iterate chunk texts in order
    ///
    /// The sequence is finite and non-restartable; order must be preserved
    /// because chunk numbers are referenced in prompts and progress logs.
    pub fn chunks<'a>(&self, content: &'a str) -> ChunkIter<'a> {
        ChunkIter {
            budget: self.char_budget(),
            lines: content.lines(),
            current: Vec::new(),
            current_len: 0,
            long_line: None,
            exhausted: false,
        }
    }

    /// Split content into numbered chunks
    pub fn split(&self, content: &str) -> Vec<Chunk> {
        let texts: Vec<String> = self.chunks(content).collect();
        let total = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, total, text })
            .collect()
    }

    /// Whether the content's estimated tokens exceed the whole-chunk budget
    pub fn needs_chunking(&self, content: &str) -> bool {
        estimate_tokens(content) > self.max_tokens_per_chunk
    }
}

/// Lazy iterator over chunk texts
pub struct ChunkIter<'a> {
    budget: usize,
    lines: std::str::Lines<'a>,
    current: Vec<&'a str>,
    current_len: usize,
    long_line: Option<&'a str>,
    exhausted: bool,
}

impl<'a> ChunkIter<'a> {
    fn flush_current(&mut self) -> Option<String> {
        if self.current.is_empty() {
            return None;
        }
        let chunk = self.current.join("\n");
        self.current.clear();
        self.current_len = 0;
        Some(chunk)
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            // Drain pieces of an over-budget line before reading further
            if let Some(rest) = self.long_line.take() {
                let cut = floor_char_boundary(rest, self.budget);
                let (piece, remainder) = rest.split_at(cut);
                if !remainder.is_empty() {
                    self.long_line = Some(remainder);
                }
                return Some(piece.to_string());
            }

            match self.lines.next() {
                Some(line) => {
                    if line.len() > self.budget {
                        // Flush any pending chunk first, then hard-split
                        self.long_line = Some(line);
                        if let Some(chunk) = self.flush_current() {
                            return Some(chunk);
                        }
                        continue;
                    }

                    if self.current_len + line.len() > self.budget {
                        if let Some(chunk) = self.flush_current() {
                            self.current.push(line);
                            self.current_len = line.len();
                            return Some(chunk);
                        }
                    }

                    self.current.push(line);
                    self.current_len += line.len();
                }
                None => {
                    if self.exhausted {
                        return None;
                    }
                    self.exhausted = true;
                    return self.flush_current();
                }
            }
        }
    }
}

/// Largest byte offset <= `max` that lands on a char boundary
///
/// Never returns 0 for non-empty input: a budget smaller than one character
/// still cuts after the first char, so a hard split always makes progress.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut cut = max;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        cut = 1;
        while cut < s.len() && !s.is_char_boundary(cut) {
            cut += 1;
        }
    }
    cut
}
