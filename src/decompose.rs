//! Rule-based expansion of a legal question into canonical search sub-queries.

use std::sync::LazyLock;

use regex::Regex;

struct Rule {
    triggers: &'static [&'static str],
    subquery: &'static str,
}

/// Topic table, evaluated in order; every matching rule contributes its
/// canonical sub-query. New legal topics are added here, not in control flow.
const RULES: &[Rule] = &[
    Rule {
        triggers: &["yaş", "uşaq"],
        subquery: "14 yaşında uşağın əməliyyat qabiliyyəti",
    },
    Rule {
        triggers: &["icazə", "valideyn"],
        subquery: "valideyn icazəsi olmadan əqd",
    },
    Rule {
        triggers: &["pul", "telefon"],
        subquery: "azyaşlının hədiyyə ilə telefon alması",
    },
    Rule {
        triggers: &["geri qaytar"],
        subquery: "uşağın etdiyi əqdin ləğvi və geri qaytarılması",
    },
];

const STOPWORDS: &[&str] = &[
    "nədir", "olaraq", "buna", "üçün", "kimi", "belə", "amma", "çünki", "var",
];

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w{4,}\b").unwrap());

/// Expand a question into an ordered, non-empty list of search sub-queries.
/// Pure and deterministic: matches are substring tests on the lowercased
/// question, output order is rule-table order.
pub fn decompose(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();

    let matched: Vec<String> = RULES
        .iter()
        .filter(|rule| rule.triggers.iter().any(|t| lowered.contains(t)))
        .map(|rule| rule.subquery.to_string())
        .collect();

    if !matched.is_empty() {
        return matched;
    }

    let keywords = extract_keywords(&lowered);
    if keywords.is_empty() {
        vec![lowered]
    } else {
        vec![keywords]
    }
}

/// Keyword fallback: word tokens of length ≥ 4 minus the stopword blacklist.
fn extract_keywords(lowered: &str) -> String {
    WORD.find_iter(lowered)
        .map(|m| m.as_str())
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_rules_fire_in_table_order() {
        let subqueries = decompose("Uşaq hədiyyə pulu ilə telefon ala bilər?");
        assert_eq!(
            subqueries,
            vec![
                "14 yaşında uşağın əməliyyat qabiliyyəti",
                "azyaşlının hədiyyə ilə telefon alması",
            ]
        );
    }

    #[test]
    fn all_rules_can_fire_together() {
        let subqueries =
            decompose("14 yaşlı uşaq valideyn icazəsi olmadan aldığı telefonu geri qaytara bilər?");
        assert_eq!(subqueries.len(), 4);
        assert_eq!(subqueries[0], "14 yaşında uşağın əməliyyat qabiliyyəti");
        assert_eq!(subqueries[3], "uşağın etdiyi əqdin ləğvi və geri qaytarılması");
    }

    #[test]
    fn triggers_match_case_insensitively() {
        let subqueries = decompose("UŞAQ");
        assert_eq!(subqueries, vec!["14 yaşında uşağın əməliyyat qabiliyyəti"]);
    }

    #[test]
    fn no_duplicate_subqueries() {
        // both triggers of one rule present still yield the rule once
        let subqueries = decompose("uşaq neçə yaşında");
        assert_eq!(subqueries.len(), 1);
    }

    #[test]
    fn fallback_extracts_keywords() {
        let subqueries = decompose("Mülki hüquq nədir və necə tətbiq olunur");
        assert_eq!(subqueries, vec!["mülki hüquq necə tətbiq olunur"]);
    }

    #[test]
    fn fallback_drops_short_words_and_stopwords() {
        let subqueries = decompose("Bu nədir üçün kimi");
        // every token is short or blacklisted, so the lowercased question survives
        assert_eq!(subqueries, vec!["bu nədir üçün kimi"]);
    }

    #[test]
    fn decompose_is_never_empty() {
        assert!(!decompose("??").is_empty());
        assert!(!decompose("a b c").is_empty());
    }
}
