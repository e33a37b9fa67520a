// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

mod batch;
mod delimiters;
mod kimi_parser;
mod stream_splitter;

// Re-export main types and functions for convenience
pub use batch::{BatchSplitter, SplitPolicy};
pub use delimiters::DelimiterPair;
pub use kimi_parser::{Kimi2ReasoningParser, Kimi3ReasoningParser, KimiReasoningParser};
pub use stream_splitter::{SplitState, StreamSplitter};

use std::collections::HashMap;
use std::sync::Arc;

use crate::tokenizers::{TokenIdType, Tokenizer};

/// The reasoning and normal-text fragments produced by one parser call.
///
/// `None` means nothing of that kind was produced this call; `Some("")` means
/// the parser produced a present-but-empty fragment. Downstream delta
/// serializers render the two differently, so neither side collapses one into
/// the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParserResult {
    /// Text extracted from within the reasoning block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,

    /// Text outside the reasoning block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ParserResult {
    /// True when this result carries no fragment of either kind.
    pub fn is_empty(&self) -> bool {
        self.reasoning_content.is_none() && self.content.is_none()
    }
}

/// Request-scoped options forwarded to parsers that support them. The
/// sentinel-tag parsers accept it for signature parity and ignore it.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: serde_json::Map<String, serde_json::Value>,
}

pub trait ReasoningParser: Send + std::fmt::Debug {
    /// Parses a standalone, complete output. Marker tags must not be included
    /// in either side of the result.
    fn detect_and_parse_reasoning(&self, text: &str, request: &RequestContext) -> ParserResult;

    /// Parses a streaming delta and updates internal state. The return value
    /// is only the newly attributable text, or `None` when nothing is
    /// classifiable until more input arrives. Token-id slices are accepted
    /// for signature parity with token-based parsers; the text-based parsers
    /// ignore them.
    fn parse_reasoning_streaming_incremental(
        &mut self,
        previous_text: &str,
        current_text: &str,
        delta_text: &str,
        previous_token_ids: &[TokenIdType],
        current_token_ids: &[TokenIdType],
        delta_token_ids: &[TokenIdType],
    ) -> Option<ParserResult>;
}

/// Known sentinel-tag parser families, selected by model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum ReasoningParserType {
    /// Start-anchored batch split; context-window streaming.
    Kimi,
    /// Tag pair honored anywhere in the text; context-window streaming.
    Kimi2,
    /// Start-anchored batch split; chunk-boundary-safe streaming.
    Kimi3,
}

#[derive(Debug)]
pub struct ReasoningParserWrapper {
    parser: Box<dyn ReasoningParser>,
}

impl ReasoningParser for ReasoningParserWrapper {
    fn detect_and_parse_reasoning(&self, text: &str, request: &RequestContext) -> ParserResult {
        self.parser.detect_and_parse_reasoning(text, request)
    }

    fn parse_reasoning_streaming_incremental(
        &mut self,
        previous_text: &str,
        current_text: &str,
        delta_text: &str,
        previous_token_ids: &[TokenIdType],
        current_token_ids: &[TokenIdType],
        delta_token_ids: &[TokenIdType],
    ) -> Option<ParserResult> {
        self.parser.parse_reasoning_streaming_incremental(
            previous_text,
            current_text,
            delta_text,
            previous_token_ids,
            current_token_ids,
            delta_token_ids,
        )
    }
}

impl ReasoningParserType {
    /// Looks up a parser family by the short name used in model configuration.
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        let mut parser_map: HashMap<&str, ReasoningParserType> = HashMap::new();
        parser_map.insert("kimi", ReasoningParserType::Kimi);
        parser_map.insert("kimi2", ReasoningParserType::Kimi2);
        parser_map.insert("kimi3", ReasoningParserType::Kimi3);

        match parser_map.get(name) {
            Some(parser_type) => Ok(*parser_type),
            None => anyhow::bail!("reasoning parser '{name}' is not implemented"),
        }
    }

    /// Builds the parser for this family. The tokenizer must be present even
    /// though the sentinel-tag parsers never consult it.
    pub fn get_reasoning_parser(
        self,
        tokenizer: Option<Arc<dyn Tokenizer>>,
    ) -> anyhow::Result<ReasoningParserWrapper> {
        let parser: Box<dyn ReasoningParser> = match self {
            ReasoningParserType::Kimi => Box::new(KimiReasoningParser::new(tokenizer)?),
            ReasoningParserType::Kimi2 => Box::new(Kimi2ReasoningParser::new(tokenizer)?),
            ReasoningParserType::Kimi3 => Box::new(Kimi3ReasoningParser::new(tokenizer)?),
        };
        Ok(ReasoningParserWrapper { parser })
    }
}
