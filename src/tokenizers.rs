// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Tokenizer seam shared with the token-based parser variants.
//!
//! The sentinel-tag parsers are purely textual and never call into the
//! tokenizer, but every parser is constructed from a request whose tokenizer
//! is already resolved, so construction requires one to be present.

pub type TokenIdType = u32;

pub trait Encoder {
    fn encode(&self, input: &str) -> anyhow::Result<Vec<TokenIdType>>;
}

pub trait Decoder {
    fn decode(&self, token_ids: &[TokenIdType], skip_special_tokens: bool)
        -> anyhow::Result<String>;
}

pub trait Tokenizer: Encoder + Decoder + Send + Sync {}

impl<T: Encoder + Decoder + Send + Sync> Tokenizer for T {}
