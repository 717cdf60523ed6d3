//! Models served through Bedrock.

use crate::types::ModelDescriptor;

pub const CLAUDE_3_HAIKU: &str = "anthropic.claude-3-haiku-20240307-v1:0";
pub const CLAUDE_3_5_SONNET: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";
pub const LLAMA3_1_8B: &str = "meta.llama3-1-8b-instruct-v1:0";
pub const LLAMA3_1_70B: &str = "meta.llama3-1-70b-instruct-v1:0";
pub const LLAMA3_1_405B: &str = "meta.llama3-1-405b-instruct-v1:0";

/// Fixed prompt of the `__video_hook` Sonnet variant.
pub const VIDEO_HOOK_SYSTEM_PROMPT: &str = "You write titles and opening hooks for short videos. \
Given a topic or a draft script, reply with five candidate titles under sixty characters \
and, for each, a spoken hook of one or two sentences that makes a viewer keep watching. \
Use plain language and no hashtags.";

pub fn anthropic_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(CLAUDE_3_HAIKU, "claude-3-haiku"),
        ModelDescriptor::new(CLAUDE_3_5_SONNET, "claude-3.5-sonnet"),
        ModelDescriptor::new(
            format!("{CLAUDE_3_5_SONNET}__video_hook"),
            "claude-3.5-sonnet (video_hook)",
        )
        .with_system_prompt(VIDEO_HOOK_SYSTEM_PROMPT),
    ]
}

pub fn llama_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(LLAMA3_1_8B, "llama3.1_8B"),
        ModelDescriptor::new(LLAMA3_1_70B, "llama3.1_70B"),
        ModelDescriptor::new(LLAMA3_1_405B, "llama3.1_405B"),
    ]
}
