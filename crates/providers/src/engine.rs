use {
    async_trait::async_trait,
    larkbot_common::types::{ChatMessage, Resolution},
};

use crate::Result;

/// Language-model backend used by the action chain and card callbacks.
///
/// Implementations own their timeouts; callers never retry.
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    /// Transcribe the audio attachment identified by `file_key`.
    async fn transcribe(&self, file_key: &str) -> Result<String>;

    /// Answer `question` given the prior conversation `history`.
    async fn generate_reply(&self, history: &[ChatMessage], question: &str) -> Result<String>;

    /// Generate one image and return it base64-encoded.
    async fn generate_image(&self, prompt: &str, resolution: Resolution) -> Result<String>;
}
