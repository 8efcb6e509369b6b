//! In-memory stand-in for [`crate::Client`].

use crate::api::StannpApi;
use crate::client::STORAGE_PREFIX;
use crate::models::{
    AddressValidationData, AddressValidationRequest, AddressValidationResponse, LetterData,
    LetterId, LetterRequest, LetterResponse, PdfContent, PdfStream, SavedPdf,
};
use crate::{ApiError, Result, pdf};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use rand::Rng;
use rand::distr::Alphanumeric;

const DEFAULT_ERROR_CODE: u16 = 500;

/// Mock implementation of [`StannpApi`] for use in callers' tests.
///
/// Configured once through [`MockClient::builder`]. Performs no network or
/// filesystem I/O. A failure flag makes its operation return an error on
/// every call; otherwise a canned response is returned if one was configured,
/// and a synthesized one if not. PDF URLs are checked against the storage
/// prefix the same way [`crate::Client`] checks them.
///
/// ```
/// # use stannp_client::{MockClient, StannpApi, LetterRequest};
/// # #[tokio::main]
/// # async fn main() {
/// let mock = MockClient::builder()
///     .fail_send_letter(true)
///     .error_code(402)
///     .error_message("insufficient balance")
///     .build();
/// let err = mock.send_letter(&LetterRequest::default()).await.unwrap_err();
/// assert_eq!(err.code, 402);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    fail_validate_address: bool,
    fail_send_letter: bool,
    fail_get_pdf_contents: bool,
    fail_save_pdf_contents: bool,
    error_code: Option<u16>,
    error_message: Option<String>,
    address_invalid: bool,
    validate_address_response: Option<AddressValidationResponse>,
    send_letter_response: Option<LetterResponse>,
    pdf_contents: Option<(String, Bytes)>,
    saved_pdf: Option<SavedPdf>,
    storage_prefix: Option<String>,
}

impl MockClient {
    /// Create a builder for configuring the mock.
    pub fn builder() -> MockClientBuilder {
        MockClientBuilder::default()
    }

    /// A mock that succeeds everywhere with synthesized responses.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage_prefix(&self) -> &str {
        self.storage_prefix.as_deref().unwrap_or(STORAGE_PREFIX)
    }

    fn failure(&self, flag: &str) -> ApiError {
        ApiError::new(
            self.error_code.unwrap_or(DEFAULT_ERROR_CODE),
            self.error_message
                .clone()
                .unwrap_or_else(|| format!("{flag} is set")),
        )
    }
}

#[async_trait]
impl StannpApi for MockClient {
    async fn validate_address(
        &self,
        _request: &AddressValidationRequest,
    ) -> Result<AddressValidationResponse> {
        if self.fail_validate_address {
            return Err(self.failure("fail_validate_address"));
        }
        if let Some(res) = &self.validate_address_response {
            return Ok(res.clone());
        }
        Ok(AddressValidationResponse {
            data: AddressValidationData {
                is_valid: !self.address_invalid,
            },
            success: true,
        })
    }

    async fn send_letter(&self, _request: &LetterRequest) -> Result<LetterResponse> {
        if self.fail_send_letter {
            return Err(self.failure("fail_send_letter"));
        }
        if let Some(res) = &self.send_letter_response {
            return Ok(res.clone());
        }
        Ok(LetterResponse {
            data: LetterData {
                cost: "0.84".to_string(),
                created: random_string(10),
                format: "US-LETTER".to_string(),
                id: LetterId::default(),
                pdf_url: format!("{}{}.pdf", self.storage_prefix(), random_string(16)),
                status: "received".to_string(),
            },
            success: true,
        })
    }

    async fn get_pdf_contents(&self, pdf_url: &str) -> Result<PdfContent> {
        if self.fail_get_pdf_contents {
            return Err(self.failure("fail_get_pdf_contents"));
        }
        let (_, url_name) = pdf::parse_pdf_url(pdf_url, self.storage_prefix())?;
        let (name, body) = match &self.pdf_contents {
            Some((name, body)) => (name.clone(), body.clone()),
            // Echo the URL so callers have something to read.
            None => (url_name, Bytes::copy_from_slice(pdf_url.as_bytes())),
        };
        Ok(PdfContent {
            stream: stream::once(async move { Ok(body) }).boxed(),
            name,
        })
    }

    async fn save_pdf_contents(&self, _stream: &mut PdfStream) -> Result<SavedPdf> {
        if self.fail_save_pdf_contents {
            return Err(self.failure("fail_save_pdf_contents"));
        }
        if let Some(saved) = &self.saved_pdf {
            return Ok(saved.clone());
        }
        Ok(SavedPdf {
            path: std::env::temp_dir().join(format!("stannp-{}.pdf", random_string(10))),
            size: 0,
        })
    }
}

/// Builder for [`MockClient`].
#[derive(Debug, Clone, Default)]
pub struct MockClientBuilder {
    inner: MockClient,
}

impl MockClientBuilder {
    /// Make `validate_address` fail.
    pub fn fail_validate_address(mut self, fail: bool) -> Self {
        self.inner.fail_validate_address = fail;
        self
    }

    /// Make `send_letter` fail.
    pub fn fail_send_letter(mut self, fail: bool) -> Self {
        self.inner.fail_send_letter = fail;
        self
    }

    /// Make `get_pdf_contents` fail.
    pub fn fail_get_pdf_contents(mut self, fail: bool) -> Self {
        self.inner.fail_get_pdf_contents = fail;
        self
    }

    /// Make `save_pdf_contents` fail.
    pub fn fail_save_pdf_contents(mut self, fail: bool) -> Self {
        self.inner.fail_save_pdf_contents = fail;
        self
    }

    /// Code used by simulated failures (default: 500).
    pub fn error_code(mut self, code: u16) -> Self {
        self.inner.error_code = Some(code);
        self
    }

    /// Message used by simulated failures (default names the failing flag).
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.inner.error_message = Some(message.into());
        self
    }

    /// Report synthesized addresses as invalid.
    pub fn address_invalid(mut self, invalid: bool) -> Self {
        self.inner.address_invalid = invalid;
        self
    }

    /// Return this response from `validate_address` instead of a synthesized one.
    pub fn validate_address_response(mut self, response: AddressValidationResponse) -> Self {
        self.inner.validate_address_response = Some(response);
        self
    }

    /// Return this response from `send_letter` instead of a synthesized one.
    pub fn send_letter_response(mut self, response: LetterResponse) -> Self {
        self.inner.send_letter_response = Some(response);
        self
    }

    /// Serve this name and body from `get_pdf_contents`.
    pub fn pdf_contents(mut self, name: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.inner.pdf_contents = Some((name.into(), body.into()));
        self
    }

    /// Return this result from `save_pdf_contents` instead of a synthesized one.
    pub fn saved_pdf(mut self, saved: SavedPdf) -> Self {
        self.inner.saved_pdf = Some(saved);
        self
    }

    /// Prefix `get_pdf_contents` accepts and synthesized letters use
    /// (default: [`STORAGE_PREFIX`]).
    pub fn storage_prefix(mut self, storage_prefix: impl Into<String>) -> Self {
        self.inner.storage_prefix = Some(storage_prefix.into());
        self
    }

    /// Finish configuration. The mock cannot be changed afterwards.
    pub fn build(self) -> MockClient {
        self.inner
    }
}

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
