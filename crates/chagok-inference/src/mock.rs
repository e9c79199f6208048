//! Deterministic mock backends for tests.
//!
//! Mocks never touch the network. The generation mock replays scripted
//! responses in order and falls back to echoing the last user message; the
//! embedding mock derives a stable vector from a content hash so identical
//! text always lands at the same point.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use chagok_core::{Error, Result};

use crate::embedding::EmbeddingBackend;
use crate::generation::{ChatMessage, GenerationBackend};
use crate::transcription::{TranscriptionBackend, TranscriptionResult};
use crate::vision::VisionBackend;

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

pub struct MockTranscriptionBackend {
    response: String,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockTranscriptionBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let mock = Self::new("");
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTranscriptionBackend {
    fn default() -> Self {
        Self::new("통화 녹취 전사 결과")
    }
}

#[async_trait]
impl TranscriptionBackend for MockTranscriptionBackend {
    async fn transcribe(&self, _audio_data: &[u8], _filename: &str) -> Result<TranscriptionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Inference("mock transcription failure".to_string()));
        }
        Ok(TranscriptionResult {
            text: self.response.clone(),
            language: Some("ko".to_string()),
            duration_secs: Some(10.0),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    fn model_name(&self) -> &str {
        "mock-whisper"
    }
}

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

pub struct MockVisionBackend {
    response: String,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockVisionBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let mock = Self::new("");
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockVisionBackend {
    fn default() -> Self {
        Self::new("메신저 대화 캡처 이미지")
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    async fn describe_image(
        &self,
        _image_data: &[u8],
        _mime_type: &str,
        _prompt: Option<&str>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Inference("mock vision failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    fn model_name(&self) -> &str {
        "mock-vision"
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

pub struct MockEmbeddingBackend {
    dimension: usize,
}

impl MockEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Stable pseudo-embedding: bytes of the content hash, centered and
        // scaled into [-0.5, 0.5], cycled to the requested dimension.
        let digest = Sha256::digest(text.as_bytes());
        Ok((0..self.dimension)
            .map(|i| (digest[i % digest.len()] as f32 - 127.5) / 255.0)
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

pub struct MockGenerationBackend {
    scripted: Mutex<VecDeque<String>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a response to be returned by the next `complete` call.
    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push_back(response.into());
        }
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Inference("mock generation failure".to_string()));
        }
        if let Ok(mut scripted) = self.scripted.lock() {
            if let Some(response) = scripted.pop_front() {
                return Ok(response);
            }
        }
        // Fall back to echoing the last user message
        Ok(messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    fn model_name(&self) -> &str {
        "mock-generation"
    }
}
