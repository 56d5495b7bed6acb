//! Fixed system instructions for each completion-service use.

use crate::classify::LanguageTag;

/// Binary eligibility gate. The reply is matched on its "yes" prefix only.
pub(crate) const ELIGIBILITY_SYSTEM: &str = "You are a classifier for a legal assistant. \
Decide whether the user's message is a question about law, legal rights, or legal procedure. \
Reply with exactly one word: yes or no.";

/// Grounded synthesis: answer only from the supplied numbered sources and
/// cite them with bracket indices.
pub(crate) const SYNTHESIS_SYSTEM: &str = "Sən Azərbaycan qanunvericiliyi üzrə ixtisaslaşmış \
hüquqşünas köməkçisisən. Yalnız verilmiş mənbələrin mətninə əsaslanaraq istifadəçinin sualına \
cavab ver; fakt uydurma. Cavabında istinad etdiyin mənbələri mötərizədə nömrə ilə göstər, \
məsələn [1], [2]. Cavab yalnız Azərbaycan dilində olmalıdır.";

/// Casual conversation outside the legal pipeline, with the reply language
/// pinned to the detected one.
pub(crate) fn chat_system(language: &LanguageTag) -> String {
    format!(
        "You are a friendly assistant for a legal-information service. The user's message is \
not a legal question; respond helpfully, keep it brief, and encourage them to ask a legal \
question. Reply in {}.",
        language.display_name()
    )
}
