//! Stannp async client implementation.

use crate::api::StannpApi;
use crate::decode::{decode_response, error_for_status, unexpected_status};
use crate::models::{
    AddressValidationRequest, AddressValidationResponse, LetterRequest, LetterResponse,
    PdfContent, PdfStream, ProviderResponse, SavedPdf,
};
use crate::{ApiError, Result, pdf};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Stannp API root.
pub const BASE_URL: &str = "https://us.stannp.com/api/v1";
/// Prefix every letter proof URL returned by Stannp starts with.
pub const STORAGE_PREFIX: &str = "https://us.stannp.com/api/v1/storage/get/";
/// Query parameter carrying the API key.
pub const API_KEY_PARAM: &str = "api_key";
/// Header carrying the letter idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

const VALIDATE_ADDRESS_PATH: &str = "addresses/validate";
const CREATE_LETTER_PATH: &str = "letters/create";
const DEFAULT_API_KEY: &str = "test123456";

/// Produces idempotency keys for letters that do not carry their own.
pub type IdempotencyKeyGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Async client for the Stannp direct-mail API.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] to set the API key,
/// print flags and endpoints. The client is immutable after construction and
/// cheap to clone; it can be shared across tasks.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    storage_prefix: String,
    clear_zone: bool,
    duplex: bool,
    post_unverified: bool,
    test_mode: bool,
    idempotency_key_generator: Option<IdempotencyKeyGenerator>,
    temp_dir: Option<PathBuf>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("storage_prefix", &self.storage_prefix)
            .field("clear_zone", &self.clear_zone)
            .field("duplex", &self.duplex)
            .field("post_unverified", &self.post_unverified)
            .field("test_mode", &self.test_mode)
            .field(
                "idempotency_key_generator",
                &self.idempotency_key_generator.is_some(),
            )
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings (test mode, placeholder API key).
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be initialised.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// The configured API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The configured API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether letters are submitted in test mode.
    pub fn is_test(&self) -> bool {
        self.test_mode
    }

    /// Whether the address zone on the first page is cleared.
    pub fn clear_zone(&self) -> bool {
        self.clear_zone
    }

    /// Whether letters are printed double-sided.
    pub fn duplex(&self) -> bool {
        self.duplex
    }

    /// Whether letters are mailed when the address cannot be verified.
    pub fn post_unverified(&self) -> bool {
        self.post_unverified
    }

    /// Validate a postal address.
    ///
    /// A well-formed call returns `success = true` even for undeliverable
    /// addresses; check `data.is_valid`.
    ///
    /// # Examples
    /// ```no_run
    /// # use stannp_client::{AddressValidationRequest, Client};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), stannp_client::ApiError> {
    /// let client = Client::builder().api_key("my-key").build()?;
    /// let res = client
    ///     .validate_address(&AddressValidationRequest {
    ///         address1: "9355 Burton Way".into(),
    ///         city: "Beverly Hills".into(),
    ///         country: "US".into(),
    ///         zipcode: "90210".into(),
    ///         ..Default::default()
    ///     })
    ///     .await?;
    /// println!("valid: {}", res.data.is_valid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn validate_address(
        &self,
        request: &AddressValidationRequest,
    ) -> Result<AddressValidationResponse> {
        self.post_form(VALIDATE_ADDRESS_PATH, request, None).await
    }

    /// Submit a letter.
    ///
    /// Client-level print flags are sent with every letter. An idempotency key
    /// from the request (or the configured generator) is sent as the
    /// [`IDEMPOTENCY_KEY_HEADER`] header.
    ///
    /// # Examples
    /// ```no_run
    /// # use stannp_client::{Client, LetterRequest, RecipientDetails};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), stannp_client::ApiError> {
    /// let client = Client::builder().api_key("my-key").build()?;
    /// let res = client
    ///     .send_letter(&LetterRequest {
    ///         template: "307051".into(),
    ///         recipient: RecipientDetails {
    ///             firstname: "Judy".into(),
    ///             address1: "9355 Burton Way".into(),
    ///             town: "Beverly Hills".into(),
    ///             zipcode: "90210".into(),
    ///             country: "US".into(),
    ///             ..Default::default()
    ///         },
    ///         ..Default::default()
    ///     })
    ///     .await?;
    /// println!("{} -> {}", res.data.id, res.data.pdf_url);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_letter(&self, request: &LetterRequest) -> Result<LetterResponse> {
        let form = self.letter_form(request);
        let key = self.idempotency_key(request);
        self.post_form(CREATE_LETTER_PATH, &form, key.as_deref())
            .await
    }

    /// Open a download of a letter proof.
    ///
    /// `pdf_url` must start with the storage prefix; anything else is rejected
    /// with code 400 before any request is made. The body is returned unread.
    ///
    /// # Examples
    /// ```no_run
    /// # use stannp_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), stannp_client::ApiError> {
    /// let client = Client::new()?;
    /// let mut pdf = client
    ///     .get_pdf_contents("https://us.stannp.com/api/v1/storage/get/abc.pdf")
    ///     .await?;
    /// let saved = client.save_pdf_contents(&mut pdf.stream).await?;
    /// println!("{} saved to {}", pdf.name, saved.path.display());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_pdf_contents(&self, pdf_url: &str) -> Result<PdfContent> {
        let (mut url, name) = pdf::parse_pdf_url(pdf_url, &self.storage_prefix)?;
        self.authorize(&mut url);

        tracing::debug!(name = %name, "fetching pdf");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("error sending request: {e}")))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            if status < 400 {
                return Err(unexpected_status(status));
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| ApiError::internal(format!("error reading response body: {e}")))?;
            return Err(error_for_status(status, &body));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();
        Ok(PdfContent { stream, name })
    }

    /// Copy a PDF stream into a new temporary file and keep it on disk.
    ///
    /// The partially written file is removed if the copy fails. The stream is
    /// not closed.
    pub async fn save_pdf_contents(&self, stream: &mut PdfStream) -> Result<SavedPdf> {
        pdf::save_stream(self.temp_dir.as_deref(), stream).await
    }

    /// Common form POST pattern.
    async fn post_form<F, T>(
        &self,
        path: &str,
        form: &F,
        idempotency_key: Option<&str>,
    ) -> Result<T>
    where
        F: Serialize + ?Sized,
        T: DeserializeOwned + ProviderResponse,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(endpoint = path, test = self.test_mode, "sending request");

        let mut request = self.http.post(url).form(form);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("error sending request: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::internal(format!("error reading response body: {e}")))?;

        decode_response(status, &body)
    }

    /// Build an authenticated URL for an API path.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let mut url =
            Url::parse(&raw).map_err(|e| ApiError::internal(format!("error parsing url: {e}")))?;
        self.authorize(&mut url);
        Ok(url)
    }

    /// Append the API key, keeping any existing query parameters.
    fn authorize(&self, url: &mut Url) {
        url.query_pairs_mut().append_pair(API_KEY_PARAM, &self.api_key);
    }

    /// Form body for `letters/create`.
    ///
    /// Merge variables land under `recipient[..]` and replace recipient
    /// fields of the same name.
    fn letter_form(&self, request: &LetterRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("test".to_string(), self.test_mode.to_string()),
            ("template".to_string(), request.template.clone()),
            ("clearzone".to_string(), self.clear_zone.to_string()),
            ("duplex".to_string(), self.duplex.to_string()),
            ("post_unverified".to_string(), self.post_unverified.to_string()),
        ];
        form.extend(
            request
                .recipient
                .fields()
                .into_iter()
                .map(|(name, value)| (format!("recipient[{name}]"), value.to_string())),
        );

        for (name, value) in &request.merge_variables {
            let key = format!("recipient[{name}]");
            match form.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value.clone(),
                None => form.push((key, value.clone())),
            }
        }
        form
    }

    /// The request's own non-empty key, else one from the generator.
    fn idempotency_key(&self, request: &LetterRequest) -> Option<String> {
        request
            .idempotency_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| self.idempotency_key_generator.as_ref().map(|generate| generate()))
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl StannpApi for Client {
    async fn validate_address(
        &self,
        request: &AddressValidationRequest,
    ) -> Result<AddressValidationResponse> {
        Client::validate_address(self, request).await
    }

    async fn send_letter(&self, request: &LetterRequest) -> Result<LetterResponse> {
        Client::send_letter(self, request).await
    }

    async fn get_pdf_contents(&self, pdf_url: &str) -> Result<PdfContent> {
        Client::get_pdf_contents(self, pdf_url).await
    }

    async fn save_pdf_contents(&self, stream: &mut PdfStream) -> Result<SavedPdf> {
        Client::save_pdf_contents(self, stream).await
    }
}

/// Builder for configuring a Stannp client.
///
/// Start with [`Client::builder`] to override defaults. Setting an option twice
/// keeps the last value.
#[derive(Clone)]
pub struct ClientBuilder {
    http: Option<reqwest::Client>,
    api_key: String,
    base_url: String,
    storage_prefix: String,
    clear_zone: bool,
    duplex: bool,
    post_unverified: bool,
    test_mode: bool,
    idempotency_key_generator: Option<IdempotencyKeyGenerator>,
    temp_dir: Option<PathBuf>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("storage_prefix", &self.storage_prefix)
            .field("test_mode", &self.test_mode)
            .finish_non_exhaustive()
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - placeholder API key `test123456`
    /// - [`BASE_URL`] and [`STORAGE_PREFIX`]
    /// - test mode, clear-zone and duplex on
    /// - post-unverified off
    /// - no idempotency key generator
    pub fn new() -> Self {
        Self {
            http: None,
            api_key: DEFAULT_API_KEY.to_string(),
            base_url: BASE_URL.to_string(),
            storage_prefix: STORAGE_PREFIX.to_string(),
            clear_zone: true,
            duplex: true,
            post_unverified: false,
            test_mode: true,
            idempotency_key_generator: None,
            temp_dir: None,
        }
    }

    /// Set the Stannp API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Override the API root (e.g. the EU endpoint or a local fake).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the prefix PDF URLs must start with.
    pub fn storage_prefix(mut self, storage_prefix: impl Into<String>) -> Self {
        self.storage_prefix = storage_prefix.into();
        self
    }

    /// Submit letters in test mode (default: true). Test letters are never
    /// printed.
    pub fn test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Clear the address zone on the first page (default: true).
    pub fn clear_zone(mut self, clear_zone: bool) -> Self {
        self.clear_zone = clear_zone;
        self
    }

    /// Print double-sided (default: true).
    pub fn duplex(mut self, duplex: bool) -> Self {
        self.duplex = duplex;
        self
    }

    /// Mail letters even if the provider cannot verify the address (default: false).
    pub fn post_unverified(mut self, post_unverified: bool) -> Self {
        self.post_unverified = post_unverified;
        self
    }

    /// Generate an idempotency key for letters that do not carry one.
    pub fn idempotency_key_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.idempotency_key_generator = Some(Arc::new(generator));
        self
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS roots, test servers).
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Directory for files written by `save_pdf_contents` (default: system temp dir).
    pub fn temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Build the client. No network request is made.
    ///
    /// # Errors
    /// Fails if the default HTTP client cannot be initialised.
    ///
    /// # Examples
    /// ```no_run
    /// # use stannp_client::Client;
    /// # fn main() -> Result<(), stannp_client::ApiError> {
    /// let client = Client::builder()
    ///     .api_key("my-key")
    ///     .duplex(false)
    ///     .post_unverified(true)
    ///     .build()?;
    /// assert!(client.is_test());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Client> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .build()
                .map_err(|e| ApiError::internal(format!("error building http client: {e}")))?,
        };

        Ok(Client {
            http,
            api_key: self.api_key,
            base_url: self.base_url,
            storage_prefix: self.storage_prefix,
            clear_zone: self.clear_zone,
            duplex: self.duplex,
            post_unverified: self.post_unverified,
            test_mode: self.test_mode,
            idempotency_key_generator: self.idempotency_key_generator,
            temp_dir: self.temp_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipientDetails;

    fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        form.iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn letter() -> LetterRequest {
        LetterRequest {
            template: "307051".to_string(),
            recipient: RecipientDetails {
                address1: "9355 Burton Way".to_string(),
                address2: "Courthouse".to_string(),
                country: "United States".to_string(),
                firstname: "Judge".to_string(),
                lastname: "Judy".to_string(),
                state: "CA".to_string(),
                title: "Mrs.".to_string(),
                town: "Beverly Hills".to_string(),
                zipcode: "90210".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let client = Client::new().unwrap();
        assert_eq!(client.api_key(), DEFAULT_API_KEY);
        assert_eq!(client.base_url(), BASE_URL);
        assert!(client.is_test());
        assert!(client.clear_zone());
        assert!(client.duplex());
        assert!(!client.post_unverified());
    }

    #[test]
    fn last_option_wins() {
        let client = Client::builder()
            .api_key("first")
            .duplex(false)
            .api_key("second")
            .duplex(true)
            .test_mode(false)
            .build()
            .unwrap();
        assert_eq!(client.api_key(), "second");
        assert!(client.duplex());
        assert!(!client.is_test());
    }

    #[test]
    fn letter_form_carries_flags_and_recipient() {
        let client = Client::builder()
            .clear_zone(false)
            .post_unverified(true)
            .build()
            .unwrap();
        let form = client.letter_form(&letter());

        assert_eq!(form_value(&form, "test"), ["true"]);
        assert_eq!(form_value(&form, "template"), ["307051"]);
        assert_eq!(form_value(&form, "clearzone"), ["false"]);
        assert_eq!(form_value(&form, "duplex"), ["true"]);
        assert_eq!(form_value(&form, "post_unverified"), ["true"]);
        assert_eq!(form_value(&form, "recipient[address1]"), ["9355 Burton Way"]);
        assert_eq!(form_value(&form, "recipient[address2]"), ["Courthouse"]);
        assert_eq!(form_value(&form, "recipient[town]"), ["Beverly Hills"]);
        assert_eq!(form.len(), 14);
    }

    #[test]
    fn merge_variables_extend_and_override_recipient() {
        let client = Client::new().unwrap();
        let mut request = letter();
        request
            .merge_variables
            .insert("address1".to_string(), "1 Override Rd".to_string());
        request
            .merge_variables
            .insert("appointment".to_string(), "2025-01-01".to_string());

        let form = client.letter_form(&request);

        assert_eq!(form_value(&form, "recipient[address1]"), ["1 Override Rd"]);
        assert_eq!(form_value(&form, "recipient[appointment]"), ["2025-01-01"]);
        assert_eq!(form.len(), 15);
    }

    #[test]
    fn idempotency_key_prefers_request_then_generator() {
        let plain = Client::new().unwrap();
        let generating = Client::builder()
            .idempotency_key_generator(|| "generated".to_string())
            .build()
            .unwrap();

        let mut request = letter();
        assert_eq!(plain.idempotency_key(&request), None);
        assert_eq!(
            generating.idempotency_key(&request).as_deref(),
            Some("generated")
        );

        request.idempotency_key = Some(String::new());
        assert_eq!(plain.idempotency_key(&request), None);

        request.idempotency_key = Some("caller".to_string());
        assert_eq!(generating.idempotency_key(&request).as_deref(), Some("caller"));
    }

    #[test]
    fn endpoint_appends_api_key() {
        let client = Client::builder()
            .api_key("secret key")
            .base_url("https://example.com/api/v1/")
            .build()
            .unwrap();
        let url = client.endpoint(VALIDATE_ADDRESS_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/v1/addresses/validate?api_key=secret+key"
        );
    }

    #[test]
    fn authorize_preserves_existing_query() {
        let client = Client::builder().api_key("k").build().unwrap();
        let mut url = Url::parse("https://example.com/dashboard/u/1?docId=abc").unwrap();
        client.authorize(&mut url);
        assert_eq!(url.query(), Some("docId=abc&api_key=k"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = Client::builder().api_key("super-secret").build().unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
