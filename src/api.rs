//! The operation contract shared by [`crate::Client`] and [`crate::MockClient`].

use crate::Result;
use crate::models::{
    AddressValidationRequest, AddressValidationResponse, LetterRequest, LetterResponse,
    PdfContent, PdfStream, SavedPdf,
};
use async_trait::async_trait;

/// Stannp operations.
///
/// Code that talks to Stannp should depend on this trait so tests can swap in
/// [`crate::MockClient`]. Dropping any returned future cancels the operation.
#[async_trait]
pub trait StannpApi: Send + Sync {
    /// Ask the provider whether an address is deliverable.
    async fn validate_address(
        &self,
        request: &AddressValidationRequest,
    ) -> Result<AddressValidationResponse>;

    /// Submit a letter for printing and mailing.
    async fn send_letter(&self, request: &LetterRequest) -> Result<LetterResponse>;

    /// Open a download of a rendered letter proof.
    async fn get_pdf_contents(&self, pdf_url: &str) -> Result<PdfContent>;

    /// Copy a PDF stream into a new temporary file.
    ///
    /// The stream is borrowed; dropping it stays the caller's job.
    async fn save_pdf_contents(&self, stream: &mut PdfStream) -> Result<SavedPdf>;
}
