use std::env;

use crate::classify::LanguageTag;

const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1";
const DEFAULT_DETECTOR_URL: &str = "https://libretranslate.com";
const DEFAULT_LEXICON_URL: &str = "https://obastan.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default authoritative legal domain, used when synthesis has no sources to
/// point at (the Azerbaijani trusted source).
pub const DEFAULT_TRUSTED_SOURCE: &str = "https://e-qanun.az";

/// Credential wrapper that never appears in logs or debug output.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
}

/// Immutable configuration for one pipeline composition. Built once in the
/// binary and passed into the client constructors; no component reads
/// environment state itself.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_api_key: Secret,
    pub search_engine_id: String,
    pub search_base_url: String,
    pub completion_api_key: Secret,
    pub completion_base_url: String,
    pub model: String,
    pub detector_base_url: String,
    pub lexicon_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            search_api_key: Secret::new(required("GOOGLE_CSE_API_KEY")?),
            search_engine_id: required("GOOGLE_CSE_ENGINE_ID")?,
            search_base_url: optional("SEARCH_URL", DEFAULT_SEARCH_URL),
            completion_api_key: Secret::new(required("OPENAI_API_KEY")?),
            completion_base_url: optional("OPENAI_BASE_URL", DEFAULT_COMPLETION_URL),
            model: optional("OPENAI_MODEL", DEFAULT_MODEL),
            detector_base_url: optional("DETECTOR_URL", DEFAULT_DETECTOR_URL),
            lexicon_base_url: optional("LEXICON_URL", DEFAULT_LEXICON_URL),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Official legal source domain for each supported language.
pub fn trusted_source(language: &LanguageTag) -> Option<&'static str> {
    match language {
        LanguageTag::Az => Some(DEFAULT_TRUSTED_SOURCE),
        LanguageTag::En => Some("https://www.law.cornell.edu/"),
        LanguageTag::De => Some("https://www.gesetze-im-internet.de/"),
        LanguageTag::Ru => Some("http://www.consultant.ru/"),
        LanguageTag::Other(_) => None,
    }
}
