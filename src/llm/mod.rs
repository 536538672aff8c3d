//! LLM integration module

pub mod client;
pub mod prompts;

pub use client::{Completion, CompletionProvider, OpenAiClient, TokenUsage};
pub use prompts::{PromptParams, PromptTemplates};
