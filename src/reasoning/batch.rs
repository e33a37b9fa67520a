// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use regex::{Regex, RegexBuilder};

use super::delimiters::DelimiterPair;
use super::ParserResult;

/// Where in a completed output a reasoning block may open.
///
/// Both policies exist in deployed model servers and differ on inputs where
/// the start tag is not the first thing generated, so they are kept separate
/// rather than collapsed into one behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitPolicy {
    /// The start tag must open the text. Anything else makes the entire
    /// output normal content, with later tags treated as literal text.
    Prefix,
    /// The first start-tag/end-tag pair is honored wherever it occurs, and
    /// text before the start tag is dropped.
    Anywhere,
}

/// One-shot splitter over a complete model output.
///
/// Stateless with respect to requests; the same splitter can classify any
/// number of outputs. Malformed, repeated, or missing tags never fail, they
/// only push text toward the content side.
#[derive(Debug, Clone)]
pub struct BatchSplitter {
    delimiters: DelimiterPair,
    policy: SplitPolicy,
    anywhere: Regex,
}

impl BatchSplitter {
    pub fn new(delimiters: DelimiterPair, policy: SplitPolicy) -> anyhow::Result<Self> {
        // Lazy group between the tags, greedy tail after them, across newlines.
        let pattern = format!(
            "{}(.*?){}(.*)",
            regex::escape(&delimiters.start),
            regex::escape(&delimiters.end)
        );
        let anywhere = RegexBuilder::new(&pattern)
            .dot_matches_new_line(true)
            .build()?;
        Ok(Self {
            delimiters,
            policy,
            anywhere,
        })
    }

    pub fn delimiters(&self) -> &DelimiterPair {
        &self.delimiters
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    pub fn split(&self, text: &str) -> ParserResult {
        match self.policy {
            SplitPolicy::Prefix => self.split_prefix(text),
            SplitPolicy::Anywhere => self.split_anywhere(text),
        }
    }

    fn split_prefix(&self, text: &str) -> ParserResult {
        let Some(rest) = text.strip_prefix(&self.delimiters.start) else {
            return ParserResult {
                reasoning_content: None,
                content: Some(text.to_string()),
            };
        };
        let Some(idx) = rest.find(&self.delimiters.end) else {
            // Reasoning never closed; the remainder is returned verbatim.
            return ParserResult {
                reasoning_content: Some(rest.to_string()),
                content: None,
            };
        };
        let reasoning = &rest[..idx];
        let content = &rest[idx + self.delimiters.end.len()..];
        ParserResult {
            reasoning_content: (!reasoning.is_empty()).then(|| reasoning.to_string()),
            content: (!content.is_empty()).then(|| content.to_string()),
        }
    }

    fn split_anywhere(&self, text: &str) -> ParserResult {
        let Some(caps) = self.anywhere.captures(text) else {
            return ParserResult {
                reasoning_content: None,
                content: Some(text.to_string()),
            };
        };
        let reasoning = caps.get(1).map_or("", |m| m.as_str());
        let content = caps.get(2).map_or("", |m| m.as_str());
        ParserResult {
            // The matched group is kept verbatim; only the tail is normalized.
            reasoning_content: Some(reasoning.to_string()),
            content: (!content.is_empty()).then(|| content.to_string()),
        }
    }
}
