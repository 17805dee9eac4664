// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token estimation through the provider, with a character-based fallback.

use mnemos_core::error::MnemosError;
use mnemos_core::text::char_len;
use mnemos_core::traits::ProviderAdapter;
use mnemos_core::types::ProviderRequest;

/// A token count and whether it came from the fallback heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenEstimate {
    pub tokens: usize,
    /// True when the count is `ceil(chars / 4)` rather than a provider count.
    pub approximate: bool,
}

impl TokenEstimate {
    pub fn exact(tokens: usize) -> Self {
        Self {
            tokens,
            approximate: false,
        }
    }

    pub fn approximate(tokens: usize) -> Self {
        Self {
            tokens,
            approximate: true,
        }
    }
}

/// Deterministic approximation: one token per four characters, rounded up.
pub fn approximate_tokens(text: &str) -> usize {
    char_len(text).div_ceil(4)
}

/// Sizes whole provider requests.
pub struct TokenEstimator<'a> {
    provider: &'a dyn ProviderAdapter,
}

impl<'a> TokenEstimator<'a> {
    pub fn new(provider: &'a dyn ProviderAdapter) -> Self {
        Self { provider }
    }

    /// Estimates `request` with a single provider count. Provider failures
    /// propagate; a provider without a counter yields the labeled
    /// approximation, summed per part.
    pub async fn estimate(&self, request: &ProviderRequest) -> Result<TokenEstimate, MnemosError> {
        match self.provider.count_request_tokens(request).await? {
            Some(tokens) => Ok(TokenEstimate::exact(tokens)),
            None => Ok(TokenEstimate::approximate(
                request
                    .countable_texts()
                    .iter()
                    .map(|t| approximate_tokens(t))
                    .sum(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn approximation_rounds_up() {
        assert_eq!(approximate_tokens(""), 0);
        assert_eq!(approximate_tokens("abc"), 1);
        assert_eq!(approximate_tokens("abcd"), 1);
        assert_eq!(approximate_tokens("abcde"), 2);
    }

    proptest! {
        #[test]
        fn approximation_bounds_characters(s in ".{0,400}") {
            let chars = s.chars().count();
            let tokens = approximate_tokens(&s);
            prop_assert!(tokens * 4 >= chars);
            prop_assert!(tokens * 4 < chars + 4);
        }
    }
}
