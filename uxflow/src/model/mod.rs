//! The generative-model seam.
//!
//! Stages talk to a [`GenerativeModel`]; the pipeline never sees HTTP.

#[cfg(feature = "gemini")]
pub mod gemini;

use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;

use crate::errors::ModelError;

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;

/// Inline image data sent alongside a prompt.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePart {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Raw image bytes.
    pub data: Arc<[u8]>,
}

impl ImagePart {
    /// Creates an image part.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: Arc<[u8]>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// The image bytes, standard base64 encoded.
    #[must_use]
    pub fn base64_data(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

impl std::fmt::Debug for ImagePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePart")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One call to the model: a text prompt plus an optional image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// The text prompt.
    pub prompt: String,
    /// The attached image, if any.
    pub image: Option<ImagePart>,
}

impl ModelRequest {
    /// A text-only request.
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    /// Attaches an image.
    #[must_use]
    pub fn with_image(mut self, image: ImagePart) -> Self {
        self.image = Some(image);
        self
    }

    /// Whether an image is attached.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// A text-generating model.
///
/// Implementations must be safe to share between concurrent runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends one request and returns the raw response text.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;
}

#[async_trait]
impl<M: GenerativeModel + ?Sized> GenerativeModel for Arc<M> {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        (**self).generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_part_base64() {
        let part = ImagePart::new("image/png", Arc::from(&b"abc"[..]));
        assert_eq!(part.base64_data(), "YWJj");
        assert!(format!("{part:?}").contains("len: 3"));
    }

    #[test]
    fn test_request_builder() {
        let request = ModelRequest::text("describe");
        assert!(!request.has_image());

        let request = request.with_image(ImagePart::new("image/jpeg", Arc::from(vec![1u8, 2])));
        assert!(request.has_image());
        assert_eq!(request.prompt, "describe");
    }

    #[tokio::test]
    async fn test_mock_model() {
        let mut mock = MockGenerativeModel::new();
        mock.expect_generate()
            .times(1)
            .returning(|request| Ok(format!("echo: {}", request.prompt)));

        let text = mock.generate(&ModelRequest::text("hi")).await.unwrap();
        assert_eq!(text, "echo: hi");
    }
}
