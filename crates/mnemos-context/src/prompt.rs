// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt text. Content is deliberately minimal and replaceable.

use std::fmt::Write as _;

use mnemos_core::types::AgentRecord;
use mnemos_memory::CoreMemoryStore;

const MEMORY_SECTION: &str = "# Memory\n\
You have three kinds of memory:\n\
1. CORE MEMORY: facts that stay in context in every interaction.\n\
2. RECALL MEMORY: past conversation messages, searchable on demand.\n\
3. ARCHIVAL MEMORY: long-term storage, searchable on demand.\n\
Use your memory tools to store important information and to look up context.";

/// Builds an agent's system prompt: base prompt, memory section, tool listing.
///
/// The base prompt is the record's own prompt when set, otherwise a default
/// naming the agent and its persona.
pub fn build_system_prompt(record: &AgentRecord, tools: &[(&str, &str)]) -> String {
    let mut prompt = if record.system_prompt.trim().is_empty() {
        default_base_prompt(record)
    } else {
        record.system_prompt.clone()
    };

    prompt.push_str("\n\n");
    prompt.push_str(MEMORY_SECTION);

    if !tools.is_empty() {
        prompt.push_str("\n\n# Available Tools\n");
        for (name, description) in tools {
            let _ = writeln!(prompt, "- {name}: {description}");
        }
    }
    prompt
}

fn default_base_prompt(record: &AgentRecord) -> String {
    let persona = if record.persona.trim().is_empty() {
        "Your goal is to be helpful, harmless, and honest in all interactions."
    } else {
        record.persona.as_str()
    };
    format!(
        "You are {}, an intelligent assistant.\n\n{persona}\n\nAlways think carefully about each request before responding.",
        record.name
    )
}

/// Renders core memory as a prompt section. Empty when there are no blocks.
pub fn render_core_memory(core: &CoreMemoryStore) -> String {
    if core.count() == 0 {
        return String::new();
    }
    let mut section = String::from("# Core Memory\n");
    for (key, value) in core.iter() {
        let _ = writeln!(section, "<{key}>\n{value}\n</{key}>");
    }
    section
}
