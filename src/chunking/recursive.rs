//! Recursive, token-bounded text splitting.
//!
//! The splitter tries the most meaningful separator first (paragraphs), and
//! only subdivides the pieces that are still too large with the next one down
//! (lines, words, and finally single characters). Pieces are then packed
//! greedily into chunks no larger than `max_size`, and every chunk after the
//! first starts with the tail of its predecessor so that sentences crossing a
//! boundary are visible in both.
//!
//! Chunks are tracked as byte spans of the input, which keeps the output
//! lossless: concatenating each chunk's non-overlapping part yields the input
//! exactly.

use crate::error::{Result, VidaskError};
use crate::tokenizer::LengthFunction;
use std::sync::Arc;

/// Separators tried in order: paragraph, line, word, character.
pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect()
}

/// Location of one chunk within the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Byte offset where the chunk text starts, overlap included.
    pub start: usize,
    /// Byte offset of the first byte not shared with the previous chunk.
    pub content_start: usize,
    /// Byte offset one past the end of the chunk.
    pub end: usize,
}

impl ChunkSpan {
    /// Full chunk text, overlap included.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// The part of the chunk that does not repeat the previous chunk.
    pub fn content<'a>(&self, source: &'a str) -> &'a str {
        &source[self.content_start..self.end]
    }

    /// Length in bytes of the prefix repeated from the previous chunk.
    pub fn overlap_len(&self) -> usize {
        self.content_start - self.start
    }
}

/// Recursive character splitter with a pluggable length metric.
#[derive(Clone)]
pub struct RecursiveSplitter {
    max_size: usize,
    overlap: usize,
    separators: Vec<String>,
    length: Arc<dyn LengthFunction>,
}

impl RecursiveSplitter {
    /// Create a splitter.
    ///
    /// `max_size` must be positive and larger than `overlap`.
    pub fn new(
        max_size: usize,
        overlap: usize,
        separators: Vec<String>,
        length: Arc<dyn LengthFunction>,
    ) -> Result<Self> {
        if max_size == 0 {
            return Err(VidaskError::Chunking("Chunk size must be positive".to_string()));
        }
        if overlap >= max_size {
            return Err(VidaskError::Chunking(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, max_size
            )));
        }
        if separators.is_empty() {
            return Err(VidaskError::Chunking("At least one separator is required".to_string()));
        }

        Ok(Self {
            max_size,
            overlap,
            separators,
            length,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Measure text with the configured metric.
    pub fn measure(&self, text: &str) -> usize {
        self.length.length(text)
    }

    /// Split `text` into chunk strings.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_spans(text)
            .into_iter()
            .map(|span| span.text(text).to_string())
            .collect()
    }

    /// Split `text` into chunk spans.
    pub fn split_spans(&self, text: &str) -> Vec<ChunkSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut merger = SpanMerger::new(text, self);
        let len = self.measure(text);
        if len <= self.max_size {
            merger.push_piece(0, text.len(), len);
        } else {
            self.split_range(&mut merger, 0, text.len(), &self.separators);
        }
        merger.finish()
    }

    fn split_range(&self, merger: &mut SpanMerger<'_>, start: usize, end: usize, separators: &[String]) {
        let text = merger.text;
        let slice = &text[start..end];

        let found = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || slice.contains(sep.as_str()));

        let Some((index, separator)) = found else {
            // Nothing left to split on.
            merger.push_oversized(start, end);
            return;
        };
        let finer = &separators[index + 1..];

        for (piece_start, piece_end) in pieces(slice, start, separator) {
            let len = self.measure(&text[piece_start..piece_end]);
            if len <= self.max_size {
                merger.push_piece(piece_start, piece_end, len);
            } else if separator.is_empty() {
                merger.push_oversized(piece_start, piece_end);
            } else {
                merger.flush();
                self.split_range(merger, piece_start, piece_end, finer);
                merger.flush();
            }
        }
    }
}

impl std::fmt::Debug for RecursiveSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveSplitter")
            .field("max_size", &self.max_size)
            .field("overlap", &self.overlap)
            .field("separators", &self.separators)
            .finish()
    }
}

/// Contiguous pieces of `slice` (offset by `base`), each ending just after a
/// separator occurrence. An empty separator yields single characters.
fn pieces(slice: &str, base: usize, separator: &str) -> Vec<(usize, usize)> {
    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, ch)| (base + i, base + i + ch.len_utf8()))
            .collect();
    }

    let mut out = Vec::new();
    let mut last = 0;
    for (i, matched) in slice.match_indices(separator) {
        let piece_end = i + matched.len();
        out.push((base + last, base + piece_end));
        last = piece_end;
    }
    if last < slice.len() {
        out.push((base + last, base + slice.len()));
    }
    out
}

/// A piece of the open chunk: start, end, measured length.
type Piece = (usize, usize, usize);

/// Chunk being filled by [`SpanMerger`].
struct OpenChunk {
    span: ChunkSpan,
    /// Pieces after `span.content_start`, in order.
    pieces: Vec<Piece>,
    /// Length of the span. Exact when `exact` is set, otherwise the measured
    /// span plus the lengths of the pieces appended since.
    estimate: usize,
    exact: bool,
}

impl OpenChunk {
    fn extend(&mut self, piece: Piece, estimate: usize, exact: bool) {
        self.span.end = piece.1;
        self.pieces.push(piece);
        self.estimate = estimate;
        self.exact = exact;
    }
}

/// Greedy packer that turns pieces into chunk spans.
///
/// Pieces are packed on the sum of their own lengths; the real span is only
/// measured once that sum passes the budget, and again when the chunk is
/// closed if it was never measured whole. Chunk cost stays linear in the
/// chunk size instead of re-measuring the growing chunk for every piece.
struct SpanMerger<'a> {
    text: &'a str,
    splitter: &'a RecursiveSplitter,
    spans: Vec<ChunkSpan>,
    current: Option<OpenChunk>,
}

impl<'a> SpanMerger<'a> {
    fn new(text: &'a str, splitter: &'a RecursiveSplitter) -> Self {
        Self {
            text,
            splitter,
            spans: Vec::new(),
            current: None,
        }
    }

    /// Add a piece that fits the budget on its own; `len` is its measured length.
    fn push_piece(&mut self, start: usize, end: usize, len: usize) {
        let text = self.text;
        let splitter = self.splitter;

        if let Some(open) = self.current.as_mut() {
            let estimate = open.estimate + len;
            if estimate <= splitter.max_size {
                open.extend((start, end, len), estimate, false);
                return;
            }
            let real = splitter.measure(&text[open.span.start..end]);
            if real <= splitter.max_size {
                open.extend((start, end, len), real, true);
                return;
            }
            self.flush();
        }
        self.open(start, end, len);
    }

    /// Emit an unsplittable piece that exceeds the budget as its own chunk.
    fn push_oversized(&mut self, start: usize, end: usize) {
        self.flush();
        self.spans.push(ChunkSpan {
            start,
            content_start: start,
            end,
        });
    }

    fn open(&mut self, start: usize, end: usize, len: usize) {
        let (chunk_start, estimate) = match self.overlap_start() {
            Some(overlap_start) => {
                let with_overlap = self.splitter.measure(&self.text[overlap_start..end]);
                if with_overlap <= self.splitter.max_size {
                    (overlap_start, with_overlap)
                } else {
                    (start, len)
                }
            }
            None => (start, len),
        };
        self.current = Some(OpenChunk {
            span: ChunkSpan {
                start: chunk_start,
                content_start: start,
                end,
            },
            pieces: vec![(start, end, len)],
            estimate,
            exact: true,
        });
    }

    /// Close the open chunk. Pieces that push an estimated chunk over budget
    /// are carried into the next chunk.
    fn flush(&mut self) {
        while let Some(open) = self.current.take() {
            for (start, end, len) in self.close(open) {
                self.push_piece(start, end, len);
            }
        }
    }

    /// Emit `open`, trimming trailing pieces until it fits. Returns the
    /// trimmed pieces in order.
    fn close(&mut self, mut open: OpenChunk) -> Vec<Piece> {
        let mut spilled = Vec::new();
        if !open.exact {
            // The first piece always fits: `open` measured it.
            while open.pieces.len() > 1
                && self.splitter.measure(&self.text[open.span.start..open.span.end])
                    > self.splitter.max_size
            {
                if let Some(piece) = open.pieces.pop() {
                    open.span.end = piece.0;
                    spilled.push(piece);
                }
            }
        }
        self.spans.push(open.span);
        spilled.reverse();
        spilled
    }

    /// Where the next chunk's overlap starts, if any.
    ///
    /// Prefers the earliest word start in the previous chunk's own content
    /// whose suffix stays within the overlap budget. Text without a usable
    /// word start (no whitespace, or a last word longer than the budget)
    /// falls back to character boundaries.
    fn overlap_start(&self) -> Option<usize> {
        if self.splitter.overlap == 0 {
            return None;
        }
        let previous = self.spans.last()?;
        let base = previous.content_start;
        let region = &self.text[base..previous.end];

        let mut word_starts = Vec::new();
        let mut after_whitespace = true;
        for (i, ch) in region.char_indices() {
            if after_whitespace && !ch.is_whitespace() {
                word_starts.push(base + i);
            }
            after_whitespace = ch.is_whitespace();
        }

        self.earliest_within_overlap(word_starts.into_iter().rev(), previous.end)
            .or_else(|| {
                let char_starts = region.char_indices().map(|(i, _)| base + i).rev();
                self.earliest_within_overlap(char_starts, previous.end)
            })
    }

    /// Walk `candidates` backwards through the text and keep the last one
    /// whose suffix up to `end` fits the overlap budget.
    fn earliest_within_overlap(&self, candidates: impl Iterator<Item = usize>, end: usize) -> Option<usize> {
        let mut best = None;
        for candidate in candidates {
            if self.splitter.measure(&self.text[candidate..end]) <= self.splitter.overlap {
                best = Some(candidate);
            } else {
                break;
            }
        }
        best
    }

    fn finish(mut self) -> Vec<ChunkSpan> {
        self.flush();
        self.spans
    }
}
