//! Per-URL document fetching and bounded plain-text extraction.

mod html;
mod pdf;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Upper bound on extracted text, in characters.
pub const MAX_TEXT_CHARS: usize = 2000;
/// Document fetches in flight at once.
pub const MAX_CONCURRENT_FETCHES: usize = 5;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESPONSE_BYTES: usize = 10_000_000;

/// The text pulled out of one source URL. `present = false` means the source
/// yielded nothing usable and must be excluded from synthesis and citation.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub url: String,
    pub text: String,
    pub present: bool,
}

impl ExtractedDocument {
    fn absent(url: &str) -> Self {
        Self {
            url: url.to_string(),
            text: String::new(),
            present: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error("invalid URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed: status {0}")]
    Status(u16),

    #[error("response too large (>{MAX_RESPONSE_BYTES} bytes)")]
    TooLarge,

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Fetch one URL and extract bounded plain text. Infallible by contract:
/// every failure mode collapses into an absent document.
pub async fn extract(http: &Client, url: &str) -> ExtractedDocument {
    match try_extract(http, url).await {
        Ok(text) if !text.is_empty() => {
            debug!(url, chars = text.chars().count(), "document extracted");
            ExtractedDocument {
                url: url.to_string(),
                text,
                present: true,
            }
        }
        Ok(_) => {
            warn!(url, "no usable text found, dropping source");
            ExtractedDocument::absent(url)
        }
        Err(e) => {
            warn!(url, error = %e, "extraction failed, dropping source");
            ExtractedDocument::absent(url)
        }
    }
}

async fn try_extract(http: &Client, url: &str) -> Result<String, ExtractError> {
    validate_url(url)?;

    let response = http
        .get(url)
        .header("User-Agent", crate::USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if let Some(len) = response.content_length()
        && len as usize > MAX_RESPONSE_BYTES
    {
        return Err(ExtractError::TooLarge);
    }

    let mut body = Vec::new();
    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_RESPONSE_BYTES {
            return Err(ExtractError::TooLarge);
        }
    }

    let text = if is_pdf(&content_type, &body) {
        pdf::extract_text(body).await?
    } else {
        html::extract_text(&decode_body(&body, &content_type))
    };

    Ok(truncate_chars(text.trim().to_string(), MAX_TEXT_CHARS))
}

/// Providers occasionally surface non-web links; only HTTP(S) is fetchable.
fn validate_url(raw: &str) -> Result<(), ExtractError> {
    let parsed = url::Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ExtractError::InvalidScheme),
    }
}

fn is_pdf(content_type: &str, body: &[u8]) -> bool {
    content_type.contains("application/pdf") || body.starts_with(b"%PDF-")
}

/// Decode the body per the content-type charset, defaulting to lossy UTF-8.
fn decode_body(body: &[u8], content_type: &str) -> String {
    let charset = content_type
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("charset="))
        .next()
        .map(|c| c.trim_matches('"'));

    if let Some(label) = charset
        && let Some(encoding) = encoding_rs::Encoding::for_label(label.as_bytes())
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    String::from_utf8_lossy(body).into_owned()
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
    text
}
