// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing as log;

use super::batch::{BatchSplitter, SplitPolicy};
use super::delimiters::DelimiterPair;
use super::stream_splitter::StreamSplitter;
use super::{ParserResult, ReasoningParser, RequestContext};
use crate::tokenizers::{TokenIdType, Tokenizer};

/// Construction-time handle to the request tokenizer. The sentinel-tag
/// parsers never call it, but a parser must not outlive the tokenizer
/// configuration it was built for.
struct TokenizerHandle(#[allow(dead_code)] Arc<dyn Tokenizer>);

impl std::fmt::Debug for TokenizerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenizerHandle")
    }
}

fn require_tokenizer(tokenizer: Option<Arc<dyn Tokenizer>>) -> anyhow::Result<TokenizerHandle> {
    match tokenizer {
        Some(tokenizer) => Ok(TokenizerHandle(tokenizer)),
        None => {
            log::warn!("reasoning parser constructed without a tokenizer");
            anyhow::bail!(
                "the model tokenizer must be provided when constructing a reasoning parser"
            )
        }
    }
}

/// Splits a streaming delta by checking which tags are visible in the
/// accumulated request text versus the delta itself.
///
/// This strategy keeps no state between calls, so a tag split across a chunk
/// boundary is not reassembled; the text on each side of the boundary is
/// classified as if the tag were absent.
fn split_delta_in_context(
    delimiters: &DelimiterPair,
    previous_text: &str,
    delta_text: &str,
) -> ParserResult {
    let start = delimiters.start.as_str();
    let end = delimiters.end.as_str();

    if previous_text.contains(start) {
        if let Some(end_idx) = delta_text.find(end) {
            // Reasoning closes inside this delta.
            let content = &delta_text[end_idx + end.len()..];
            ParserResult {
                reasoning_content: Some(delta_text[..end_idx].to_string()),
                content: (!content.is_empty()).then(|| content.to_string()),
            }
        } else if previous_text.contains(end) {
            ParserResult {
                reasoning_content: None,
                content: Some(delta_text.to_string()),
            }
        } else {
            ParserResult {
                reasoning_content: Some(delta_text.to_string()),
                content: None,
            }
        }
    } else if let Some(start_idx) = delta_text.find(start) {
        if let Some(end_idx) = delta_text.find(end) {
            let begin = start_idx + start.len();
            // A stray end tag can precede the start tag inside one delta;
            // classify nothing as reasoning rather than slicing backwards.
            let reasoning = if begin <= end_idx {
                &delta_text[begin..end_idx]
            } else {
                ""
            };
            let content = &delta_text[end_idx + end.len()..];
            ParserResult {
                reasoning_content: Some(reasoning.to_string()),
                content: (!content.is_empty()).then(|| content.to_string()),
            }
        } else {
            ParserResult {
                reasoning_content: Some(delta_text.to_string()),
                content: None,
            }
        }
    } else if let Some(end_idx) = delta_text.find(end) {
        // The model closed a block it never visibly opened. Split at the tag
        // anyway so the tail is not misattributed to reasoning.
        let content = &delta_text[end_idx + end.len()..];
        ParserResult {
            reasoning_content: Some(delta_text[..end_idx].to_string()),
            content: (!content.is_empty()).then(|| content.to_string()),
        }
    } else if previous_text.contains(end) {
        ParserResult {
            reasoning_content: None,
            content: Some(delta_text.to_string()),
        }
    } else {
        ParserResult {
            reasoning_content: Some(delta_text.to_string()),
            content: None,
        }
    }
}

/// Reasoning parser for Kimi-family models, which wrap chain-of-thought in
/// `◁think▷ ... ◁/think▷` tags.
///
/// Completed outputs are split with the start-anchored policy; streaming
/// deltas are classified against the accumulated request text.
#[derive(Debug)]
pub struct KimiReasoningParser {
    batch: BatchSplitter,
    delimiters: DelimiterPair,
    _tokenizer: TokenizerHandle,
}

impl KimiReasoningParser {
    pub fn new(tokenizer: Option<Arc<dyn Tokenizer>>) -> anyhow::Result<Self> {
        let _tokenizer = require_tokenizer(tokenizer)?;
        let delimiters = DelimiterPair::kimi();
        Ok(Self {
            batch: BatchSplitter::new(delimiters.clone(), SplitPolicy::Prefix)?,
            delimiters,
            _tokenizer,
        })
    }
}

impl ReasoningParser for KimiReasoningParser {
    fn detect_and_parse_reasoning(&self, text: &str, _request: &RequestContext) -> ParserResult {
        self.batch.split(text)
    }

    fn parse_reasoning_streaming_incremental(
        &mut self,
        previous_text: &str,
        _current_text: &str,
        delta_text: &str,
        _previous_token_ids: &[TokenIdType],
        _current_token_ids: &[TokenIdType],
        _delta_token_ids: &[TokenIdType],
    ) -> Option<ParserResult> {
        Some(split_delta_in_context(
            &self.delimiters,
            previous_text,
            delta_text,
        ))
    }
}

/// Variant of the Kimi parser that honors a tag pair anywhere in a completed
/// output instead of requiring it at the very beginning. Text generated
/// before the start tag is dropped by that policy.
#[derive(Debug)]
pub struct Kimi2ReasoningParser {
    batch: BatchSplitter,
    delimiters: DelimiterPair,
    _tokenizer: TokenizerHandle,
}

impl Kimi2ReasoningParser {
    pub fn new(tokenizer: Option<Arc<dyn Tokenizer>>) -> anyhow::Result<Self> {
        let _tokenizer = require_tokenizer(tokenizer)?;
        let delimiters = DelimiterPair::kimi();
        Ok(Self {
            batch: BatchSplitter::new(delimiters.clone(), SplitPolicy::Anywhere)?,
            delimiters,
            _tokenizer,
        })
    }
}

impl ReasoningParser for Kimi2ReasoningParser {
    fn detect_and_parse_reasoning(&self, text: &str, _request: &RequestContext) -> ParserResult {
        self.batch.split(text)
    }

    fn parse_reasoning_streaming_incremental(
        &mut self,
        previous_text: &str,
        _current_text: &str,
        delta_text: &str,
        _previous_token_ids: &[TokenIdType],
        _current_token_ids: &[TokenIdType],
        _delta_token_ids: &[TokenIdType],
    ) -> Option<ParserResult> {
        Some(split_delta_in_context(
            &self.delimiters,
            previous_text,
            delta_text,
        ))
    }
}

/// Kimi parser whose streaming side runs the chunk-boundary-safe state
/// machine, reassembling tags split across any number of deltas.
#[derive(Debug)]
pub struct Kimi3ReasoningParser {
    batch: BatchSplitter,
    splitter: StreamSplitter,
    _tokenizer: TokenizerHandle,
}

impl Kimi3ReasoningParser {
    pub fn new(tokenizer: Option<Arc<dyn Tokenizer>>) -> anyhow::Result<Self> {
        let _tokenizer = require_tokenizer(tokenizer)?;
        let delimiters = DelimiterPair::kimi();
        Ok(Self {
            batch: BatchSplitter::new(delimiters.clone(), SplitPolicy::Prefix)?,
            splitter: StreamSplitter::new(delimiters),
            _tokenizer,
        })
    }
}

impl ReasoningParser for Kimi3ReasoningParser {
    fn detect_and_parse_reasoning(&self, text: &str, _request: &RequestContext) -> ParserResult {
        self.batch.split(text)
    }

    fn parse_reasoning_streaming_incremental(
        &mut self,
        _previous_text: &str,
        _current_text: &str,
        delta_text: &str,
        _previous_token_ids: &[TokenIdType],
        _current_token_ids: &[TokenIdType],
        _delta_token_ids: &[TokenIdType],
    ) -> Option<ParserResult> {
        log::debug!("streaming delta of {} bytes", delta_text.len());
        self.splitter.consume(delta_text)
    }
}
