//! Request and response records for the Stannp API.
//!
//! Field names follow the provider's snake_case wire format.

use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Marker for decoded provider envelopes that carry a `success` flag.
///
/// The decoder uses it to turn a 2xx body reporting `success: false` into an
/// error, so a returned value always has `success == true`.
pub trait ProviderResponse {
    /// The envelope's `success` flag.
    fn success(&self) -> bool;
}

/// Address to check with `addresses/validate`.
///
/// Sent as a flat form body; no field is checked client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValidationRequest {
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub company: String,
    pub country: String,
    pub zipcode: String,
}

/// Payload of an address validation response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressValidationData {
    pub is_valid: bool,
}

/// Response from `addresses/validate`.
///
/// `success` reports whether the call went through, `data.is_valid` whether
/// the provider recognised the address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressValidationResponse {
    pub data: AddressValidationData,
    pub success: bool,
}

impl ProviderResponse for AddressValidationResponse {
    fn success(&self) -> bool {
        self.success
    }
}

/// Recipient block of a letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub address1: String,
    pub address2: String,
    pub country: String,
    pub firstname: String,
    pub lastname: String,
    pub state: String,
    pub title: String,
    pub town: String,
    pub zipcode: String,
}

impl RecipientDetails {
    /// Recipient fields as `(name, value)` pairs, in wire order.
    pub(crate) fn fields(&self) -> [(&'static str, &str); 9] {
        [
            ("title", &self.title),
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("address1", &self.address1),
            ("address2", &self.address2),
            ("town", &self.town),
            ("zipcode", &self.zipcode),
            ("state", &self.state),
            ("country", &self.country),
        ]
    }
}

/// Letter submission for `letters/create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterRequest {
    /// Provider template identifier.
    pub template: String,
    pub recipient: RecipientDetails,
    /// Extra template placeholders. A key equal to a recipient field name
    /// replaces that field's value.
    pub merge_variables: BTreeMap<String, String>,
    /// Deduplication token; wins over the client's generator when non-empty.
    pub idempotency_key: Option<String>,
}

/// Letter identifier as delivered by the provider.
///
/// Stannp sends the id either as a JSON number or as a JSON string. Both
/// forms decode without precision loss and serialize back the way they
/// arrived. Use [`LetterId::as_i64`] or the `Display` impl to read it without
/// caring about the wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LetterId {
    Number(serde_json::Number),
    Text(String),
}

impl LetterId {
    /// Numeric value of the id, if it is an integer in either form.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl Default for LetterId {
    fn default() -> Self {
        Self::Number(0_i64.into())
    }
}

impl From<i64> for LetterId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<String> for LetterId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for LetterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Payload of a letter creation response.
///
/// Missing or `null` fields decode to their defaults: the letter has already
/// been accepted once a 2xx arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterData {
    #[serde(deserialize_with = "null_as_default")]
    pub cost: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created: String,
    #[serde(deserialize_with = "null_as_default")]
    pub format: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: LetterId,
    /// Storage URL of the rendered proof.
    #[serde(rename = "pdf", deserialize_with = "null_as_default")]
    pub pdf_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

/// Response from `letters/create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterResponse {
    pub data: LetterData,
    pub success: bool,
}

impl ProviderResponse for LetterResponse {
    fn success(&self) -> bool {
        self.success
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Byte stream of a PDF body. Read it once; dropping it closes the connection.
pub type PdfStream = BoxStream<'static, std::io::Result<Bytes>>;

/// An open PDF download.
///
/// The body has not been read yet. The caller owns the stream and closes it by
/// dropping it, typically after [`crate::StannpApi::save_pdf_contents`].
pub struct PdfContent {
    pub stream: PdfStream,
    /// File name taken from the last path segment of the PDF URL.
    pub name: String,
}

impl fmt::Debug for PdfContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfContent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A PDF persisted to a temporary file.
///
/// The file stays on disk until the caller removes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPdf {
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER_JSON_NUMBER_ID: &str = r#"{
        "data": {
            "cost": "10.99",
            "created": "2023-06-22",
            "format": "A4",
            "id": 12345,
            "pdf": "https://example.com/document.pdf",
            "status": "completed"
        },
        "success": true
    }"#;

    #[test]
    fn letter_id_number_and_string_normalize_to_same_value() {
        let from_number: LetterResponse = serde_json::from_str(LETTER_JSON_NUMBER_ID).unwrap();
        let from_string: LetterResponse =
            serde_json::from_str(&LETTER_JSON_NUMBER_ID.replace("12345", "\"12345\"")).unwrap();

        for res in [&from_number, &from_string] {
            assert_eq!(res.data.id.as_i64(), Some(12345));
            assert_eq!(res.data.id.to_string(), "12345");
            assert_eq!(res.data.pdf_url, "https://example.com/document.pdf");
        }
    }

    #[test]
    fn letter_id_reserializes_in_wire_form() {
        let number: LetterId = serde_json::from_str("12345").unwrap();
        let text: LetterId = serde_json::from_str("\"12345\"").unwrap();
        assert_eq!(serde_json::to_string(&number).unwrap(), "12345");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"12345\"");
    }

    #[test]
    fn letter_id_keeps_large_values_exact() {
        let id: LetterId = serde_json::from_str("9007199254740993").unwrap();
        assert_eq!(id.as_i64(), Some(9_007_199_254_740_993));
        assert_eq!(id.to_string(), "9007199254740993");
    }

    #[test]
    fn decorated_letter_id_has_no_numeric_value() {
        let id = LetterId::from("ltr-42".to_string());
        assert_eq!(id.as_i64(), None);
        assert_eq!(id.to_string(), "ltr-42");
    }

    #[test]
    fn sparse_letter_body_decodes_with_defaults() {
        let res: LetterResponse = serde_json::from_str(
            r#"{"data":{"id":null,"pdf":"https://example.com/a.pdf","status":"test","cost":null},"success":true}"#,
        )
        .unwrap();
        assert!(res.success);
        assert_eq!(res.data.id, LetterId::default());
        assert_eq!(res.data.id.as_i64(), Some(0));
        assert_eq!(res.data.created, "");
        assert_eq!(res.data.cost, "");
        assert_eq!(res.data.status, "test");
    }

    #[test]
    fn address_response_without_data_is_not_valid() {
        let res: AddressValidationResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(!res.data.is_valid);
        assert!(res.success);
    }

    #[test]
    fn address_response_uses_snake_case() {
        let res: AddressValidationResponse =
            serde_json::from_str(r#"{"data":{"is_valid":true},"success":true}"#).unwrap();
        assert!(res.data.is_valid);
        assert!(res.success());
    }
}
