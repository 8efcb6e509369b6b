//! # Stannp Client
//! Asynchronous wrapper around the Stannp direct-mail HTTP API: validate postal addresses, submit letters for printing and mailing, and download the rendered PDF proof, using [`Client`] and [`ClientBuilder`].
//!
//! ## Testing your own code
//! Depend on the [`StannpApi`] trait rather than on [`Client`]. [`MockClient`] implements the same contract in memory, with per-operation failure flags and canned responses.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`. The client installs no timeouts: wrap calls in `tokio::time::timeout` (or drop the future) to cancel them.
//!
//! ## Logging
//! Requests and provider errors are reported through `tracing`. Install a subscriber in your application to see them.
//!
//! ## Errors
//! Every operation returns [`ApiError`]. Provider errors carry the real HTTP status in `code`; local failures (transport, decoding, temp files) use 500 and precondition failures 400. The crate-wide [`Result`] alias wraps it.
//!
//! ## Example
//! ```no_run
//! use stannp_client::{Client, LetterRequest, RecipientDetails};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stannp_client::ApiError> {
//!     let client = Client::builder().api_key("my-key").build()?;
//!
//!     let letter = client
//!         .send_letter(&LetterRequest {
//!             template: "307051".into(),
//!             recipient: RecipientDetails {
//!                 firstname: "Judy".into(),
//!                 address1: "9355 Burton Way".into(),
//!                 town: "Beverly Hills".into(),
//!                 zipcode: "90210".into(),
//!                 country: "US".into(),
//!                 ..Default::default()
//!             },
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let mut pdf = client.get_pdf_contents(&letter.data.pdf_url).await?;
//!     let saved = client.save_pdf_contents(&mut pdf.stream).await?;
//!     println!("Proof saved to {}", saved.path.display());
//!     Ok(())
//! }
//! ```

mod api;
mod client;
pub mod decode;
mod error;
mod mock;
mod models;
mod pdf;

pub use api::StannpApi;
pub use client::{
    API_KEY_PARAM, BASE_URL, Client, ClientBuilder, IDEMPOTENCY_KEY_HEADER,
    IdempotencyKeyGenerator, STORAGE_PREFIX,
};
pub use error::ApiError;
pub use mock::{MockClient, MockClientBuilder};
pub use models::{
    AddressValidationData, AddressValidationRequest, AddressValidationResponse, LetterData,
    LetterId, LetterRequest, LetterResponse, PdfContent, PdfStream, ProviderResponse,
    RecipientDetails, SavedPdf,
};

/// Result type alias for Stannp operations.
///
/// This is equivalent to `std::result::Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;
