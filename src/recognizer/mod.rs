use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::meals::MealEntry;

mod gemini;

pub use gemini::GeminiRecognizer;

/// Failures of the external recognition call.
///
/// A photo that is not food is not a failure: the recognizer normalizes it
/// into an all-zero [`MealEntry`].
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognizer transport error: {0}")]
    Transport(String),

    #[error("recognizer rejected the request: {0}")]
    Api(String),

    #[error("recognizer returned no text content")]
    EmptyResponse,
}

/// Turns a food photo plus an optional free-text hint into a structured
/// meal entry.
#[async_trait]
pub trait MealRecognizer: Send + Sync {
    async fn recognize(&self, image: Bytes, hint: &str) -> Result<MealEntry, RecognitionError>;
}
