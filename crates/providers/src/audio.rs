//! Audio attachment retrieval for transcription.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

/// Raw audio bytes plus the metadata the transcription upload needs.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Resolve a platform file key to audio bytes.
///
/// The chat transport implements this by downloading the message resource;
/// the console uses [`FsAudioSource`].
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn fetch(&self, file_key: &str) -> Result<AudioClip>;
}

/// Reads audio files from disk, treating the file key as a path.
#[derive(Debug, Clone, Default)]
pub struct FsAudioSource {
    root: Option<PathBuf>,
}

impl FsAudioSource {
    /// Resolve keys relative to `root`; keys escaping it are rejected.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Accept any path, absolute or relative to the working directory.
    pub fn unrestricted() -> Self {
        Self { root: None }
    }

    fn resolve(&self, file_key: &str) -> Result<PathBuf> {
        let key = Path::new(file_key);
        let Some(root) = &self.root else {
            return Ok(key.to_path_buf());
        };
        let escapes = key
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::audio(file_key, "path escapes the audio directory"));
        }
        Ok(root.join(key))
    }
}

#[async_trait]
impl AudioSource for FsAudioSource {
    async fn fetch(&self, file_key: &str) -> Result<AudioClip> {
        let path = self.resolve(file_key)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::audio(file_key, e.to_string()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.opus")
            .to_string();
        Ok(AudioClip {
            bytes,
            mime_type: mime_type_for(&file_name),
            file_name,
        })
    }
}

/// MIME type by file extension. Platform voice notes are Opus in Ogg.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("opus" | "ogg" | "oga") => "audio/ogg",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("webm") => "audio/webm",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("voice.opus"), b"OggS").unwrap();

        let clip = FsAudioSource::new(dir.path()).fetch("voice.opus").await.unwrap();
        assert_eq!(clip.bytes, b"OggS");
        assert_eq!(clip.file_name, "voice.opus");
        assert_eq!(clip.mime_type, "audio/ogg");
    }

    #[tokio::test]
    async fn rejects_traversal_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsAudioSource::new(dir.path());
        assert!(matches!(
            source.fetch("../secret.wav").await,
            Err(Error::Audio { .. })
        ));
        assert!(matches!(
            source.fetch("/etc/passwd").await,
            Err(Error::Audio { .. })
        ));
    }

    #[tokio::test]
    async fn missing_file_is_audio_error() {
        let err = FsAudioSource::unrestricted()
            .fetch("/nonexistent/voice.opus")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/voice.opus"));
    }

    #[test]
    fn mime_types() {
        assert_eq!(mime_type_for("a.MP3"), "audio/mpeg");
        assert_eq!(mime_type_for("a.wav"), "audio/wav");
        assert_eq!(mime_type_for("noext"), "application/octet-stream");
    }
}
