//! Completion engine: chat replies, image generation and audio transcription.
//!
//! The dispatcher depends only on [`CompletionEngine`]; [`OpenAiCompatEngine`]
//! implements it against any OpenAI-compatible HTTP API.

pub mod audio;
pub mod engine;
pub mod error;
pub mod openai_compat;

pub use {
    audio::{AudioClip, AudioSource, FsAudioSource},
    engine::CompletionEngine,
    error::{Error, Result},
    openai_compat::OpenAiCompatEngine,
};
