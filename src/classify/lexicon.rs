use std::time::Duration;

use reqwest::Client;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("lexicon error: status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction for the dictionary-lookup service used by the classifier's
/// regional fallback.
pub trait Lexicon {
    async fn lookup(&self, word: &str) -> Result<bool, LexiconError>;
}

/// Client for a word-existence endpoint: `GET /api/words/{word}` answers 200
/// for a known word and 404 for an unknown one.
#[derive(Clone)]
pub struct HttpLexicon {
    http: Client,
    base_url: String,
}

impl HttpLexicon {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Lexicon for HttpLexicon {
    async fn lookup(&self, word: &str) -> Result<bool, LexiconError> {
        let url = format!("{}/api/words/{}", self.base_url, word);

        let response = self
            .http
            .get(&url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;

        match response.status().as_u16() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(LexiconError::Status(status)),
        }
    }
}
