//! Language classification and the legal-eligibility gate.

pub mod detector;
pub mod lexicon;

use tracing::{debug, warn};

use crate::llm::{CompletionClient, CompletionError, prompts};
use detector::LanguageDetector;
use lexicon::Lexicon;

/// Azerbaijani-specific letters, both cases. The uppercase of dotless `ı` is
/// plain `I` and is deliberately absent — it would match ordinary Latin text.
const AZ_LETTERS: [char; 13] = [
    'ə', 'Ə', 'ğ', 'Ğ', 'ı', 'ö', 'Ö', 'ç', 'Ç', 'ş', 'Ş', 'ü', 'Ü',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageTag {
    Az,
    En,
    De,
    Ru,
    /// Detected but unsupported; carries the raw detector output so callers
    /// can report what was seen.
    Other(String),
}

impl LanguageTag {
    pub fn from_iso(code: &str) -> Self {
        match code {
            "az" => Self::Az,
            "en" => Self::En,
            "de" => Self::De,
            "ru" => Self::Ru,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Az => "az",
            Self::En => "en",
            Self::De => "de",
            Self::Ru => "ru",
            Self::Other(raw) => raw,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Az => "Azerbaijani",
            Self::En => "English",
            Self::De => "German",
            Self::Ru => "Russian",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Determine the question's language. Never fails: detector errors collapse
/// into a locale-informed default.
pub async fn classify(
    detector: &impl LanguageDetector,
    lexicon: &impl Lexicon,
    text: &str,
    locale_hint: Option<&str>,
) -> LanguageTag {
    if has_az_letters(text) {
        debug!("Azerbaijani letters present, skipping detector");
        return LanguageTag::Az;
    }

    let raw = match detector.detect(text).await {
        Ok(code) => code.trim().to_lowercase(),
        Err(e) => {
            warn!(error = %e, "language detection failed, using locale fallback");
            return fallback_tag(locale_hint);
        }
    };

    let tag = LanguageTag::from_iso(&raw);
    if tag.is_supported() {
        return tag;
    }

    // Detector gave up on the supported set. Azerbaijani written without its
    // special letters confuses detectors, so when the caller's locale points
    // at Azerbaijan, confirm individual words against the dictionary.
    if hints_azerbaijan(locale_hint) {
        for word in words(text) {
            match lexicon.lookup(&word).await {
                Ok(true) => {
                    debug!(word, "dictionary confirmed Azerbaijani");
                    return LanguageTag::Az;
                }
                Ok(false) => {}
                Err(e) => warn!(word, error = %e, "dictionary lookup failed"),
            }
        }
    }

    tag
}

/// Binary eligibility gate: is this a legal question at all? Delegated to the
/// completion service; any reply not prefixed "yes" counts as "no".
pub async fn is_legal_question(
    completion: &impl CompletionClient,
    text: &str,
) -> Result<bool, CompletionError> {
    let reply = completion.complete(prompts::ELIGIBILITY_SYSTEM, text).await?;
    Ok(reply.trim().to_ascii_lowercase().starts_with("yes"))
}

fn has_az_letters(text: &str) -> bool {
    text.chars().any(|c| AZ_LETTERS.contains(&c))
}

fn hints_azerbaijan(locale_hint: Option<&str>) -> bool {
    locale_hint.is_some_and(|hint| {
        hint.eq_ignore_ascii_case("az") || hint.eq_ignore_ascii_case("aze")
    })
}

fn fallback_tag(locale_hint: Option<&str>) -> LanguageTag {
    if hints_azerbaijan(locale_hint) {
        LanguageTag::Az
    } else {
        LanguageTag::En
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}
