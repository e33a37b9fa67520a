// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use super::delimiters::DelimiterPair;
use super::ParserResult;

/// Where the stream currently sits relative to the reasoning block.
///
/// Transitions run strictly forward: `Initial` to `Reasoning` to `Output`,
/// or `Initial` straight to `Output`. `Output` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitState {
    Initial,
    Reasoning,
    Output,
}

/// Incremental splitter fed one chunk of generated text at a time.
///
/// A plain value with no construction ceremony: build one per request and
/// call [`consume`](Self::consume) once per chunk, in generation order. The
/// splitter reassembles sentinel tags split across any number of chunk
/// boundaries while withholding at most `max(start.len(), end.len()) - 1`
/// bytes between calls. Everything it emits is final; no later chunk can
/// revise an earlier fragment.
#[derive(Debug, Clone)]
pub struct StreamSplitter {
    delimiters: DelimiterPair,
    state: SplitState,
    pending: String,
}

impl StreamSplitter {
    pub fn new(delimiters: DelimiterPair) -> Self {
        Self {
            delimiters,
            state: SplitState::Initial,
            pending: String::new(),
        }
    }

    pub fn state(&self) -> SplitState {
        self.state
    }

    /// Text withheld because it may still complete a sentinel tag.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Feeds the next chunk.
    ///
    /// Returns `None` while nothing is classifiable yet: the consumed text
    /// so far is a prefix of the start tag and the caller must supply more
    /// input before any output is knowable.
    pub fn consume(&mut self, chunk: &str) -> Option<ParserResult> {
        let mut combined = std::mem::take(&mut self.pending);
        combined.push_str(chunk);

        if self.state == SplitState::Initial {
            if let Some(rest) = combined.strip_prefix(&self.delimiters.start) {
                self.state = SplitState::Reasoning;
                combined = rest.to_string();
            } else if combined.is_empty() {
                // Nothing seen yet; the start tag is still possible.
                return None;
            } else if self.delimiters.start.starts_with(combined.as_str()) {
                // Could still grow into the start tag.
                self.pending = combined;
                return None;
            } else {
                // The response does not open with the start tag, so no
                // reasoning block can ever begin. Any buffered candidate is
                // released as ordinary content along with the chunk.
                self.state = SplitState::Output;
            }
        }

        let mut reasoning = None;
        if self.state == SplitState::Reasoning {
            match combined.find(&self.delimiters.end) {
                Some(idx) => {
                    self.state = SplitState::Output;
                    let rest = combined.split_off(idx + self.delimiters.end.len());
                    combined.truncate(idx);
                    // Kept verbatim even when empty; only content below is
                    // normalized to absence.
                    reasoning = Some(combined);
                    combined = rest;
                }
                None => {
                    let withheld = partial_tag_suffix(&combined, &self.delimiters.end);
                    if withheld > 0 {
                        self.pending = combined.split_off(combined.len() - withheld);
                    }
                    return Some(ParserResult {
                        reasoning_content: Some(combined),
                        content: None,
                    });
                }
            }
        }

        Some(ParserResult {
            reasoning_content: reasoning,
            content: (!combined.is_empty()).then_some(combined),
        })
    }
}

/// Byte length of the longest proper, non-empty prefix of `tag` that `text`
/// ends with. Candidate lengths follow `tag`'s char boundaries, so the cut is
/// always valid UTF-8.
fn partial_tag_suffix(text: &str, tag: &str) -> usize {
    tag.char_indices()
        .map(|(i, _)| i)
        .filter(|&i| i > 0)
        .rev()
        .find(|&i| text.ends_with(&tag[..i]))
        .unwrap_or(0)
}
