// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use reasoning_parsers::tokenizers::{Decoder, Encoder, TokenIdType, Tokenizer};
use reasoning_parsers::{
    ParserResult, ReasoningParser, ReasoningParserType, RequestContext,
};

#[derive(Debug)]
struct ByteTokenizer;

impl Encoder for ByteTokenizer {
    fn encode(&self, input: &str) -> anyhow::Result<Vec<TokenIdType>> {
        Ok(input.bytes().map(TokenIdType::from).collect())
    }
}

impl Decoder for ByteTokenizer {
    fn decode(
        &self,
        token_ids: &[TokenIdType],
        _skip_special_tokens: bool,
    ) -> anyhow::Result<String> {
        let bytes: Vec<u8> = token_ids.iter().map(|&id| id as u8).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn tokenizer() -> Option<Arc<dyn Tokenizer>> {
    Some(Arc::new(ByteTokenizer))
}

/// Streams `text` through a parser one character at a time and concatenates
/// the emitted fragments, the way a chat-completion chunk serializer would.
fn stream_by_char(parser: &mut dyn ReasoningParser, text: &str) -> (String, String) {
    let mut previous = String::new();
    let mut reasoning = String::new();
    let mut content = String::new();
    for ch in text.chars() {
        let delta = ch.to_string();
        let current = format!("{previous}{delta}");
        if let Some(result) =
            parser.parse_reasoning_streaming_incremental(&previous, &current, &delta, &[], &[], &[])
        {
            reasoning.push_str(result.reasoning_content.as_deref().unwrap_or(""));
            content.push_str(result.content.as_deref().unwrap_or(""));
        }
        previous = current;
    }
    (reasoning, content)
}

#[test]
fn registry_builds_every_known_parser() {
    for name in ["kimi", "kimi2", "kimi3"] {
        let parser_type = ReasoningParserType::from_name(name).unwrap();
        let parser = parser_type.get_reasoning_parser(tokenizer()).unwrap();
        let result =
            parser.detect_and_parse_reasoning("◁think▷a◁/think▷b", &RequestContext::default());
        assert_eq!(result.reasoning_content.as_deref(), Some("a"), "{name}");
        assert_eq!(result.content.as_deref(), Some("b"), "{name}");
    }
}

#[test]
fn registry_requires_a_tokenizer() {
    for name in ["kimi", "kimi2", "kimi3"] {
        let parser_type = ReasoningParserType::from_name(name).unwrap();
        assert!(parser_type.get_reasoning_parser(None).is_err(), "{name}");
    }
}

#[test]
fn batch_policies_diverge_on_mid_text_tags() {
    let text = "x◁think▷a◁/think▷b";
    let request = RequestContext::default();

    let prefix = ReasoningParserType::Kimi
        .get_reasoning_parser(tokenizer())
        .unwrap()
        .detect_and_parse_reasoning(text, &request);
    assert_eq!(prefix.reasoning_content, None);
    assert_eq!(prefix.content.as_deref(), Some(text));

    let anywhere = ReasoningParserType::Kimi2
        .get_reasoning_parser(tokenizer())
        .unwrap()
        .detect_and_parse_reasoning(text, &request);
    assert_eq!(anywhere.reasoning_content.as_deref(), Some("a"));
    assert_eq!(anywhere.content.as_deref(), Some("b"));
}

#[test]
fn char_by_char_streaming_matches_batch_split() {
    let text = "◁think▷the model thinks◁/think▷then it answers";
    let mut parser = ReasoningParserType::Kimi3
        .get_reasoning_parser(tokenizer())
        .unwrap();

    let (reasoning, content) = stream_by_char(&mut parser, text);
    assert_eq!(reasoning, "the model thinks");
    assert_eq!(content, "then it answers");

    let batch = ReasoningParserType::Kimi3
        .get_reasoning_parser(tokenizer())
        .unwrap()
        .detect_and_parse_reasoning(text, &RequestContext::default());
    assert_eq!(batch.reasoning_content.as_deref(), Some(reasoning.as_str()));
    assert_eq!(batch.content.as_deref(), Some(content.as_str()));
}

#[test]
fn streaming_never_fails_on_pathological_outputs() {
    let inputs = [
        "◁/think▷◁think▷◁/think▷",
        "◁think▷◁think▷◁/think▷◁/think▷",
        "◁think▷unclosed",
        "plain text with ▷ and ◁ noise",
        "",
    ];
    for name in ["kimi", "kimi2", "kimi3"] {
        for input in inputs {
            let mut parser = ReasoningParserType::from_name(name)
                .unwrap()
                .get_reasoning_parser(tokenizer())
                .unwrap();
            // Classification varies by variant; completing without an error
            // is the contract.
            let _ = stream_by_char(&mut parser, input);
            let _ = parser.detect_and_parse_reasoning(input, &RequestContext::default());
        }
    }
}

#[test]
fn delta_serialization_distinguishes_empty_from_absent() {
    let present_but_empty = ParserResult {
        reasoning_content: Some(String::new()),
        content: None,
    };
    assert_eq!(
        serde_json::to_string(&present_but_empty).unwrap(),
        r#"{"reasoning_content":""}"#
    );

    let absent = ParserResult::default();
    assert_eq!(serde_json::to_string(&absent).unwrap(), "{}");
}
