use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Content containers tried in order: the legal portal's document wrappers
/// first, then generic semantic containers, then the whole body.
const CONTENT_SELECTORS: &[&str] = &[
    "#zoomDocumentContainer",
    "#sectonText",
    "#__next",
    "main",
    "article",
    "body",
];

static SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect()
});

/// Extract readable text from an HTML document: the first matching container
/// with non-empty text wins, inter-element whitespace collapsed to single
/// spaces.
pub(super) fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let text = collect_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }

    String::new()
}

fn collect_text(element: ElementRef<'_>) -> String {
    let mut content = String::new();
    for piece in element.text() {
        for word in piece.split_whitespace() {
            if !content.is_empty() {
                content.push(' ');
            }
            content.push_str(word);
        }
    }
    content
}
