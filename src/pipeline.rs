//! Pipeline orchestration: routing a question through classification,
//! retrieval, extraction, synthesis, and formatting.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info};

use crate::classify::{self, LanguageTag, detector::LanguageDetector, lexicon::Lexicon};
use crate::config::{DEFAULT_TRUSTED_SOURCE, trusted_source};
use crate::decompose;
use crate::extract::{self, ExtractedDocument};
use crate::format;
use crate::llm::{self, CompletionClient, CompletionError};
use crate::search::{self, client::SearchClient};
use crate::synthesize::{self, Synthesis};

/// Shown by the caller instead of an answer when synthesis fails. Fixed text,
/// never produced by the model.
pub const APOLOGY: &str = "Cavab yaradılarkən xəta baş verdi.";

const UNSUPPORTED_MESSAGE: &str =
    "Sorry, I can only handle Azerbaijani, English, German, and Russian legal questions.";

/// Which terminal produced the answer, so callers can tell a grounded answer
/// from a degraded or conversational one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Synthesized from extracted sources, with citations.
    Grounded,
    /// Legal question, but nothing usable was retrieved.
    NoSources,
    /// Legal question in a supported non-Azerbaijani language.
    Referral,
    /// Legal question in an unsupported language.
    Unsupported,
    /// Not a legal question; answered by the general-chat collaborator.
    Casual,
}

#[derive(Debug)]
pub struct FormattedAnswer {
    pub html: String,
    pub kind: AnswerKind,
    pub language: LanguageTag,
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("answer synthesis failed: {0}")]
    Synthesis(#[from] CompletionError),
}

/// One composed question-answering pipeline. Invocations are independent:
/// all methods take `&self` and share nothing mutable, so concurrent
/// questions never interfere.
pub struct Pipeline<S, C, D, L> {
    http: Client,
    search: S,
    completion: C,
    detector: D,
    lexicon: L,
}

impl<S, C, D, L> Pipeline<S, C, D, L>
where
    S: SearchClient,
    C: CompletionClient,
    D: LanguageDetector,
    L: Lexicon,
{
    pub fn new(http: Client, search: S, completion: C, detector: D, lexicon: L) -> Self {
        Self {
            http,
            search,
            completion,
            detector,
            lexicon,
        }
    }

    /// Answer one question. Every failure mode except boundary validation and
    /// completion-service failure still yields a best-effort answer.
    pub async fn answer(
        &self,
        question: &str,
        locale_hint: Option<&str>,
    ) -> Result<FormattedAnswer, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let language =
            classify::classify(&self.detector, &self.lexicon, question, locale_hint).await;
        info!(language = language.code(), "question classified");

        if !classify::is_legal_question(&self.completion, question).await? {
            debug!("not a legal question, delegating to general chat");
            let html = llm::chat(&self.completion, question, &language).await?;
            return Ok(FormattedAnswer {
                html,
                kind: AnswerKind::Casual,
                language,
            });
        }

        if language != LanguageTag::Az {
            return Ok(refer_elsewhere(language));
        }

        let subqueries = decompose::decompose(question);
        debug!(?subqueries, "question decomposed");

        let sources = search::retrieve(&self.search, &subqueries).await;
        info!(sources = sources.len(), "sources retrieved");

        // `buffered` keeps documents in source-set order whatever the
        // completion timing.
        let documents: Vec<ExtractedDocument> = stream::iter(&sources)
            .map(|source| extract::extract(&self.http, &source.url))
            .buffered(extract::MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let fallback = trusted_source(&language).unwrap_or(DEFAULT_TRUSTED_SOURCE);
        match synthesize::synthesize(&self.completion, question, &sources, &documents, fallback)
            .await?
        {
            Synthesis::Grounded(answer) => {
                info!(citations = answer.citations.len(), "answer synthesized");
                Ok(FormattedAnswer {
                    html: format::format(&answer),
                    kind: AnswerKind::Grounded,
                    language,
                })
            }
            Synthesis::NoSources(message) => Ok(FormattedAnswer {
                html: message,
                kind: AnswerKind::NoSources,
                language,
            }),
        }
    }
}

/// Terminal for legal questions outside Azerbaijani: a referral to the
/// language's trusted source, or a generic message when there is none.
fn refer_elsewhere(language: LanguageTag) -> FormattedAnswer {
    match trusted_source(&language) {
        Some(domain) => FormattedAnswer {
            html: format!("Please consult the official legal source: {domain}"),
            kind: AnswerKind::Referral,
            language,
        },
        None => FormattedAnswer {
            html: UNSUPPORTED_MESSAGE.to_string(),
            kind: AnswerKind::Unsupported,
            language,
        },
    }
}
