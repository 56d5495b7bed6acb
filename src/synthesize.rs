//! Grounded answer synthesis with citation binding.

use tracing::{debug, info};

use crate::extract::ExtractedDocument;
use crate::llm::{CompletionClient, CompletionError, prompts};
use crate::search::Source;

/// One bound citation: `index` is 1-based and contiguous over the present
/// documents in source-set order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub index: usize,
    pub url: String,
    pub title: String,
}

#[derive(Debug)]
pub struct SynthesizedAnswer {
    pub body: String,
    pub citations: Vec<Citation>,
}

/// Outcome of a synthesis attempt: a grounded answer, or the canned degraded
/// message when nothing usable was extracted. Both are terminal successes.
#[derive(Debug)]
pub enum Synthesis {
    Grounded(SynthesizedAnswer),
    NoSources(String),
}

/// Ask the completion service to answer strictly from the extracted texts.
/// `sources` and `documents` are parallel, both in source-set order.
pub async fn synthesize(
    completion: &impl CompletionClient,
    question: &str,
    sources: &[Source],
    documents: &[ExtractedDocument],
    fallback_domain: &str,
) -> Result<Synthesis, CompletionError> {
    let present: Vec<(&Source, &ExtractedDocument)> = sources
        .iter()
        .zip(documents)
        .filter(|(_, doc)| doc.present)
        .collect();

    if present.is_empty() {
        info!("no usable sources, returning degraded answer");
        return Ok(Synthesis::NoSources(no_sources_message(fallback_domain)));
    }

    let citations: Vec<Citation> = present
        .iter()
        .enumerate()
        .map(|(i, (source, _))| Citation {
            index: i + 1,
            url: source.url.clone(),
            title: source.title.clone(),
        })
        .collect();

    let user_prompt = render_user_prompt(question, &present);
    debug!(sources = present.len(), "requesting grounded answer");

    let body = completion
        .complete(prompts::SYNTHESIS_SYSTEM, &user_prompt)
        .await?;

    Ok(Synthesis::Grounded(SynthesizedAnswer { body, citations }))
}

/// Render the question and the numbered source texts the model must ground in.
fn render_user_prompt(question: &str, present: &[(&Source, &ExtractedDocument)]) -> String {
    let mut prompt = format!("Sual: {question}\n\nMənbələr:\n");
    for (i, (_, doc)) in present.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n\n", i + 1, doc.text));
    }
    prompt
}

fn no_sources_message(fallback_domain: &str) -> String {
    format!(
        "Üzr istəyirik, uyğun rəsmi hüquqi mənbə tapılmadı. {fallback_domain} saytında əl ilə \
axtarış edə bilərsiniz.\nƏlavə olaraq, Mülki Məcəlləyə baxa bilərsiniz: \
https://e-qanun.az/framework/8"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedCompletion {
        responses: Mutex<VecDeque<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedCompletion {
        fn answering(body: &str) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([Ok(body.to_string())])),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: CompletionError) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([Err(error)])),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn captured(&self) -> Vec<(String, String)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl CompletionClient for ScriptedCompletion {
        async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CompletionError::RateLimited))
        }
    }

    fn source(url: &str, title: &str) -> Source {
        Source {
            url: url.to_string(),
            title: title.to_string(),
        }
    }

    fn document(url: &str, text: &str) -> ExtractedDocument {
        ExtractedDocument {
            url: url.to_string(),
            text: text.to_string(),
            present: !text.is_empty(),
        }
    }

    #[tokio::test]
    async fn citations_are_contiguous_over_present_documents() {
        let completion = ScriptedCompletion::answering("Cavab [1][2].");
        let sources = vec![
            source("https://a.az", "A"),
            source("https://b.az", "B"),
            source("https://c.az", "C"),
        ];
        let documents = vec![
            document("https://a.az", "maddə 28"),
            document("https://b.az", ""),
            document("https://c.az", "maddə 29"),
        ];

        let result = synthesize(&completion, "sual", &sources, &documents, "https://e-qanun.az")
            .await
            .unwrap();

        let Synthesis::Grounded(answer) = result else {
            panic!("expected grounded answer");
        };
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].index, 1);
        assert_eq!(answer.citations[0].url, "https://a.az");
        // the absent document is skipped, c.az becomes [2]
        assert_eq!(answer.citations[1].index, 2);
        assert_eq!(answer.citations[1].url, "https://c.az");
    }

    #[tokio::test]
    async fn prompt_numbers_match_citation_indices() {
        let completion = ScriptedCompletion::answering("Cavab.");
        let sources = vec![source("https://a.az", "A"), source("https://b.az", "B")];
        let documents = vec![
            document("https://a.az", "birinci mətn"),
            document("https://b.az", "ikinci mətn"),
        ];

        synthesize(&completion, "sual", &sources, &documents, "https://e-qanun.az")
            .await
            .unwrap();

        let captured = completion.captured();
        assert_eq!(captured.len(), 1);
        let (system, user) = &captured[0];
        assert!(system.contains("mənbələrin mətninə əsaslanaraq"));
        assert!(user.starts_with("Sual: sual"));
        assert!(user.contains("[1] birinci mətn"));
        assert!(user.contains("[2] ikinci mətn"));
    }

    #[tokio::test]
    async fn no_present_documents_degrades_without_a_completion_call() {
        let completion = ScriptedCompletion::answering("should not be used");
        let sources = vec![source("https://a.az", "A")];
        let documents = vec![document("https://a.az", "")];

        let result = synthesize(&completion, "sual", &sources, &documents, "https://e-qanun.az")
            .await
            .unwrap();

        let Synthesis::NoSources(message) = result else {
            panic!("expected degraded answer");
        };
        assert!(message.contains("https://e-qanun.az"));
        assert!(completion.captured().is_empty());
    }

    #[tokio::test]
    async fn empty_source_set_degrades() {
        let completion = ScriptedCompletion::answering("unused");

        let result = synthesize(&completion, "sual", &[], &[], "https://e-qanun.az")
            .await
            .unwrap();

        assert!(matches!(result, Synthesis::NoSources(_)));
    }

    #[tokio::test]
    async fn completion_failure_propagates() {
        let completion = ScriptedCompletion::failing(CompletionError::RateLimited);
        let sources = vec![source("https://a.az", "A")];
        let documents = vec![document("https://a.az", "mətn")];

        let err = synthesize(&completion, "sual", &sources, &documents, "https://e-qanun.az")
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::RateLimited));
    }
}
