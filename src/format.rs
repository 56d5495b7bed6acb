//! Deterministic reflow of raw synthesis output into structured markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::synthesize::{Citation, SynthesizedAnswer};

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static LIST_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.\s+").unwrap());
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s*([A-ZƏĞİÖÇŞÜ])").unwrap());

/// Reflow a synthesized answer into final markup: emphasis conversion,
/// numbered-run lifting, sentence breaks, semantic wrapper, and the trailing
/// sources block. Pure and deterministic; applied exactly once to raw
/// synthesis output.
pub fn format(answer: &SynthesizedAnswer) -> String {
    let body = BOLD.replace_all(&answer.body, "<strong>$1</strong>");
    let body = lift_numbered_list(&body);
    let body = SENTENCE_END.replace_all(&body, ".<br>$1");

    let mut html = format!("<div class=\"legal-answer\">{}</div>", body.trim());
    if !answer.citations.is_empty() {
        html.push_str(&sources_block(&answer.citations));
    }
    html
}

/// Collect runs of two or more numbered lines into an ordered list appended
/// after the body. Each item runs until the next numbered line or the end of
/// the text; `<ol>` renumbers from 1 regardless of the original digits.
fn lift_numbered_list(body: &str) -> String {
    let marks: Vec<(usize, usize)> = LIST_MARK
        .find_iter(body)
        .map(|m| (m.start(), m.end()))
        .collect();
    if marks.len() < 2 {
        return body.to_string();
    }

    let mut out = body[..marks[0].0].trim_end().to_string();
    out.push_str("<ol>");
    for (i, (_, content_start)) in marks.iter().enumerate() {
        let end = marks
            .get(i + 1)
            .map(|(next_start, _)| *next_start)
            .unwrap_or(body.len());
        out.push_str("<li>");
        out.push_str(body[*content_start..end].trim());
        out.push_str("</li>");
    }
    out.push_str("</ol>");
    out
}

fn sources_block(citations: &[Citation]) -> String {
    let mut html =
        String::from("<br><div class=\"legal-sources\"><strong>İstinadlar:</strong><ul>");
    for citation in citations {
        let label = if citation.title.is_empty() {
            &citation.url
        } else {
            &citation.title
        };
        html.push_str(&format!(
            "<li>[{}] <a href=\"{}\" target=\"_blank\">{}</a></li>",
            citation.index,
            escape_html(&citation.url),
            escape_html(label)
        ));
    }
    html.push_str("</ul></div>");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
