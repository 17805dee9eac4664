// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local token counting with tiktoken encodings.

use std::sync::Arc;

use dashmap::DashMap;
use mnemos_core::MnemosError;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Counts tokens with the encoding of each model, cached per model name.
///
/// Models tiktoken does not know fall back to `cl100k_base`.
#[derive(Default)]
pub struct TokenCounter {
    encoders: DashMap<String, Arc<CoreBPE>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, text: &str, model: &str) -> Result<usize, MnemosError> {
        let encoder = self.encoder(model)?;
        Ok(encoder.encode_with_special_tokens(text).len())
    }

    fn encoder(&self, model: &str) -> Result<Arc<CoreBPE>, MnemosError> {
        if let Some(encoder) = self.encoders.get(model) {
            return Ok(Arc::clone(&encoder));
        }
        let encoder = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => {
                debug!(model, "no tiktoken encoding for model, using cl100k_base");
                tiktoken_rs::cl100k_base().map_err(|e| MnemosError::Provider {
                    message: format!("failed to load cl100k_base encoding: {e}"),
                    source: Some(e.into()),
                })?
            }
        };
        let encoder = Arc::new(encoder);
        self.encoders
            .insert(model.to_string(), Arc::clone(&encoder));
        Ok(encoder)
    }
}
