//! Incremental `multipart/form-data` framing.
//!
//! The encoder only produces delimiters and part headers; file bytes are
//! written between them by the body producer so the content never has to be
//! buffered whole.

use rand::{Rng, distr::Alphanumeric};

/// Length of generated boundaries.
pub const BOUNDARY_LEN: usize = 32;

/// Generate a random alphanumeric boundary.
#[must_use]
pub fn generate_boundary() -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(BOUNDARY_LEN)
        .collect()
}

/// Frames parts of a single multipart body.
///
/// Call [`MultipartEncoder::file_header`] first, then
/// [`MultipartEncoder::text_field`] for each trailing field, then
/// [`MultipartEncoder::closing`].
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    boundary: String,
}

impl MultipartEncoder {
    /// Create an encoder with a freshly generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create an encoder with an explicit boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    /// Boundary separating parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Opening delimiter and headers of the binary file part.
    #[must_use]
    pub fn file_header(&self, field: &str, filename: &str) -> Vec<u8> {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            self.boundary,
            escape_quotes(field),
            escape_quotes(filename),
        )
        .into_bytes()
    }

    /// A complete text part following an earlier part.
    #[must_use]
    pub fn text_field(&self, name: &str, value: &str) -> Vec<u8> {
        format!(
            "\r\n--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
            self.boundary,
            escape_quotes(name),
            value,
        )
        .into_bytes()
    }

    /// Final delimiter ending the body.
    #[must_use]
    pub fn closing(&self) -> Vec<u8> {
        format!("\r\n--{}--\r\n", self.boundary).into_bytes()
    }
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
