//! Persisting PDF streams to temporary files.

use crate::models::{PdfStream, SavedPdf};
use crate::{ApiError, Result};
use futures_util::StreamExt;
use reqwest::Url;
use std::path::Path;
use tokio::io::AsyncWriteExt;

const FILE_PREFIX: &str = "stannp-";
const FILE_SUFFIX: &str = ".pdf";

/// Check a proof URL against the storage prefix and take its file name.
///
/// A foreign prefix or a URL without a file name is a 400; a URL that does
/// not parse is a local failure (500).
pub(crate) fn parse_pdf_url(pdf_url: &str, storage_prefix: &str) -> Result<(Url, String)> {
    if !pdf_url.starts_with(storage_prefix) {
        return Err(ApiError::bad_request(format!(
            "pdf url [{pdf_url}] does not start with [{storage_prefix}]"
        )));
    }

    let url = Url::parse(pdf_url)
        .map_err(|e| ApiError::internal(format!("error parsing pdf url: {e}")))?;
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request(format!("pdf url [{pdf_url}] has no file name")))?;
    Ok((url, name))
}

/// Copy `stream` into a uniquely named file under `dir` (or the system temp
/// dir).
///
/// The file is removed again if anything fails before the copy completes.
pub(crate) async fn save_stream(dir: Option<&Path>, stream: &mut PdfStream) -> Result<SavedPdf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(FILE_PREFIX).suffix(FILE_SUFFIX);
    let temp = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ApiError::internal(format!("error creating temp file: {e}")))?;

    // `temp` deletes the file on drop until `keep` is called below.
    let handle = temp
        .reopen()
        .map_err(|e| ApiError::internal(format!("error opening temp file: {e}")))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut size = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::internal(format!("error reading pdf stream: {e}")))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(format!("error writing temp file: {e}")))?;
        size += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("error flushing temp file: {e}")))?;
    drop(file);

    let (_, path) = temp
        .keep()
        .map_err(|e| ApiError::internal(format!("error persisting temp file: {e}")))?;

    tracing::debug!(path = %path.display(), size, "saved pdf");
    Ok(SavedPdf { path, size })
}
