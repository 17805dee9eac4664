// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly and token budgeting for Mnemos generation calls.
//!
//! A generation request is built from:
//! - **Mandatory part**: system prompt, every core memory block, tool schemas
//! - **Recall slice**: recent or query-relevant entries, ending with the inbound message
//!
//! The recall slice shrinks from its oldest entry until the estimate fits
//! the budget. If the mandatory part plus the inbound message still does not
//! fit, assembly fails with `ContextOverflow` and no request is produced.

pub mod assembler;
pub mod estimator;
pub mod prompt;

pub use assembler::{compose_system_prompt, AssembledContext, ContextAssembler, ContextInput};
pub use estimator::{approximate_tokens, TokenEstimate, TokenEstimator};
pub use prompt::{build_system_prompt, render_core_memory};
