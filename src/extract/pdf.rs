use super::ExtractError;

/// Pull the text of every page out of a PDF body. `pdf-extract` is CPU-bound
/// and can stall on exotic fonts, so it runs on the blocking pool.
pub(super) async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractError::Pdf(e.to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}
