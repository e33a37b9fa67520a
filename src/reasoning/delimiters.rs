// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

/// The start and end sentinel tags marking a reasoning block.
///
/// Both tags are non-empty and distinct, and stay fixed for the lifetime of
/// any splitter or parser built from the pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DelimiterPair {
    pub start: String,
    pub end: String,
}

impl DelimiterPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        let start = start.into();
        let end = end.into();
        debug_assert!(!start.is_empty() && !end.is_empty());
        debug_assert_ne!(start, end);
        Self { start, end }
    }

    /// Tags emitted by the Kimi family of models.
    pub fn kimi() -> Self {
        Self::new("◁think▷", "◁/think▷")
    }

    /// The `<think>` dialect used by DeepSeek-R1 style models.
    pub fn think() -> Self {
        Self::new("<think>", "</think>")
    }

    /// Longest tag length in bytes. A streaming splitter withholds strictly
    /// fewer bytes than this between calls.
    pub fn max_len(&self) -> usize {
        self.start.len().max(self.end.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_well_formed() {
        for pair in [DelimiterPair::kimi(), DelimiterPair::think()] {
            assert!(!pair.start.is_empty());
            assert!(!pair.end.is_empty());
            assert_ne!(pair.start, pair.end);
        }
    }

    #[test]
    fn test_max_len_picks_longer_tag() {
        let pair = DelimiterPair::kimi();
        assert_eq!(pair.max_len(), pair.end.len());

        let pair = DelimiterPair::new("<LONG_OPEN>", "<X>");
        assert_eq!(pair.max_len(), pair.start.len());
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let pair = DelimiterPair::kimi();
        let json = serde_json::to_string(&pair).unwrap();
        let back: DelimiterPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }
}
