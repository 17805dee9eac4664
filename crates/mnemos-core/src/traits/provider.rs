// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM provider integrations (Anthropic, OpenAI, etc.).

use async_trait::async_trait;

use crate::error::MnemosError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for LLM provider integrations.
///
/// Each provider translates its wire format into the normalized
/// [`ProviderResponse`], so callers never branch on provider identity.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Counts tokens in `text` for `model`.
    ///
    /// Returns `Ok(None)` when the provider has no token counter. Callers then
    /// fall back to an approximation. A failing counter returns `Err`.
    async fn count_tokens(&self, text: &str, model: &str) -> Result<Option<usize>, MnemosError> {
        let _ = (text, model);
        Ok(None)
    }

    /// Counts the tokens of a whole request.
    ///
    /// The default counts each of [`ProviderRequest::countable_texts`]
    /// concurrently and sums them, or returns `Ok(None)` if any part could
    /// not be counted. Providers that count a full request in one call
    /// override this.
    async fn count_request_tokens(
        &self,
        request: &ProviderRequest,
    ) -> Result<Option<usize>, MnemosError> {
        let texts = request.countable_texts();
        let counts = futures::future::try_join_all(
            texts.iter().map(|text| self.count_tokens(text, &request.model)),
        )
        .await?;
        Ok(counts.into_iter().sum())
    }

    /// Maximum context size in tokens for `model`.
    fn max_context_size(&self, model: &str) -> usize;

    /// Sends a generation request and returns the normalized response.
    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, MnemosError>;
}
