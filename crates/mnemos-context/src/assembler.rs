// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budgeted assembly of a provider request from an agent's memory.

use mnemos_config::model::{ContextConfig, RecallSelection};
use mnemos_core::error::MnemosError;
use mnemos_core::traits::ProviderAdapter;
use mnemos_core::types::{AgentMessage, ChatMessage, MessageType, ProviderRequest, ToolSchema};
use mnemos_memory::MemoryManager;
use tracing::debug;

use crate::estimator::{TokenEstimate, TokenEstimator};
use crate::prompt::render_core_memory;

/// Everything one assembly needs from the calling agent.
pub struct ContextInput<'a> {
    pub agent_id: &'a str,
    pub model: &'a str,
    /// The agent's own ceiling, combined with the provider limit.
    pub context_window_limit: usize,
    /// Base system prompt, without core memory.
    pub system_prompt: &'a str,
    pub memory: &'a MemoryManager,
    pub tools: Vec<ToolSchema>,
    /// The message being answered. Must already be appended to recall.
    pub inbound: &'a AgentMessage,
}

/// A request that fits the budget, plus how it was sized.
#[derive(Debug)]
pub struct AssembledContext {
    pub request: ProviderRequest,
    pub estimate: TokenEstimate,
    /// Effective token budget the request was checked against.
    pub limit: usize,
    /// Recall entries dropped to fit the budget.
    pub dropped: usize,
}

/// Assembles provider requests under a token budget.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    recall_window: usize,
    recall_selection: RecallSelection,
    response_reserve_tokens: usize,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ContextAssembler {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            recall_window: config.recall_window.max(1),
            recall_selection: config.recall_selection,
            response_reserve_tokens: config.response_reserve_tokens,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Effective budget: the smaller of the provider and agent limits, minus
    /// the response reserve.
    pub fn effective_limit(&self, provider_limit: usize, agent_limit: usize) -> usize {
        provider_limit
            .min(agent_limit)
            .saturating_sub(self.response_reserve_tokens)
    }

    /// Builds a request that fits the budget, or fails with `ContextOverflow`.
    ///
    /// The system prompt, core memory, tool schemas, and the inbound message
    /// are mandatory. When the full request does not fit, the smallest
    /// number of oldest recall entries is dropped, found by bisection so a
    /// counting provider sees a logarithmic number of count requests.
    pub async fn assemble(
        &self,
        provider: &dyn ProviderAdapter,
        input: ContextInput<'_>,
    ) -> Result<AssembledContext, MnemosError> {
        let limit = self.effective_limit(
            provider.max_context_size(input.model),
            input.context_window_limit,
        );
        let estimator = TokenEstimator::new(provider);

        let slice = self.select_recall(input.memory, input.inbound);
        let messages: Vec<ChatMessage> = slice
            .iter()
            .map(|m| to_chat_message(input.agent_id, m))
            .collect();
        let candidates = messages.len();

        let mut request = ProviderRequest {
            model: input.model.to_string(),
            system_prompt: compose_system_prompt(input.system_prompt, input.memory),
            messages,
            tools: (!input.tools.is_empty()).then_some(input.tools),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let mut estimate = estimator.estimate(&request).await?;
        let mut start = 0;

        if estimate.tokens > limit && candidates > 1 {
            // The inbound message is last and is never dropped.
            let all = std::mem::take(&mut request.messages);
            let (mut lo, mut hi) = (1, candidates - 1);
            let mut fitting: Option<(usize, TokenEstimate)> = None;
            while lo <= hi {
                let mid = lo + (hi - lo) / 2;
                request.messages = all[mid..].to_vec();
                let trial = estimator.estimate(&request).await?;
                if trial.tokens <= limit {
                    fitting = Some((mid, trial));
                    hi = mid - 1;
                } else {
                    if mid == candidates - 1 {
                        estimate = trial;
                    }
                    lo = mid + 1;
                }
            }
            match fitting {
                Some((fit_start, fit_estimate)) => {
                    start = fit_start;
                    estimate = fit_estimate;
                    request.messages = all[fit_start..].to_vec();
                }
                None => start = candidates - 1,
            }
        }

        if estimate.tokens > limit {
            metrics::counter!("mnemos_context_overflow_total").increment(1);
            tracing::warn!(
                estimated_tokens = estimate.tokens,
                limit,
                approximate = estimate.approximate,
                "context exceeds budget"
            );
            return Err(MnemosError::ContextOverflow {
                estimated_tokens: estimate.tokens,
                limit,
            });
        }

        debug!(
            estimated_tokens = estimate.tokens,
            limit,
            approximate = estimate.approximate,
            recall_included = candidates - start,
            dropped = start,
            "assembled context"
        );

        Ok(AssembledContext {
            request,
            estimate,
            limit,
            dropped: start,
        })
    }

    /// Chronological recall candidates ending with `inbound`.
    fn select_recall(&self, memory: &MemoryManager, inbound: &AgentMessage) -> Vec<AgentMessage> {
        let mut slice = match self.recall_selection {
            RecallSelection::Recent => memory.recent_recall(self.recall_window),
            RecallSelection::Relevant => {
                let mut hits = memory.search_recall(&inbound.content, self.recall_window);
                hits.reverse();
                hits
            }
        };
        if let Some(pos) = slice.iter().rposition(|m| m == inbound) {
            slice.remove(pos);
        } else if slice.len() >= self.recall_window {
            slice.remove(0);
        }
        slice.push(inbound.clone());
        slice
    }
}

/// Base prompt followed by the rendered core memory blocks.
pub fn compose_system_prompt(base: &str, memory: &MemoryManager) -> String {
    let core = render_core_memory(memory.core());
    if core.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        core
    } else {
        format!("{base}\n\n{core}")
    }
}

fn to_chat_message(agent_id: &str, message: &AgentMessage) -> ChatMessage {
    match message.message_type {
        MessageType::Text if message.sender_id == agent_id => {
            ChatMessage::assistant(message.content.clone())
        }
        MessageType::Text => ChatMessage::user(message.content.clone()),
        other => ChatMessage::user(format!("[{other}] {}", message.content)),
    }
}
