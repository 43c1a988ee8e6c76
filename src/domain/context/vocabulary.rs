//! Keyword vocabularies for the preset domains.

use crate::domain::foundation::ChatDomain;

const TECHNOLOGY: &[&str] = &[
    "ai",
    "gpt",
    "automation",
    "software",
    "api",
    "code",
    "coding",
    "machine learning",
    "chatbot",
    "llm",
    "model",
    "cloud",
    "data",
    "integration",
    "workflow",
    "programming",
    "developer",
    "algorithm",
    "neural",
    "python",
];

const HEALTHCARE: &[&str] = &[
    "patient",
    "patients",
    "diagnosis",
    "diagnose",
    "medical",
    "health",
    "healthcare",
    "doctor",
    "physician",
    "clinic",
    "clinical",
    "hospital",
    "treatment",
    "symptom",
    "symptoms",
    "medication",
    "prescription",
    "nurse",
    "therapy",
    "radiology",
    "dicom",
    "x ray",
    "mri",
    "scan",
];

/// Keywords for `domain`. Multi-word entries are matched as phrases.
pub fn keywords(domain: ChatDomain) -> &'static [&'static str] {
    match domain {
        ChatDomain::Technology => TECHNOLOGY,
        ChatDomain::Healthcare => HEALTHCARE,
    }
}

/// Lowercases `text` and collapses every run of non-alphanumeric characters
/// into a single space, padded on both ends so ` keyword ` matches whole
/// tokens and phrases alike.
pub fn normalize(text: &str) -> String {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!(" {} ", tokens.join(" "))
}

/// Number of distinct keywords of `domain` present in normalised text.
pub fn count_matches(normalized: &str, domain: ChatDomain) -> usize {
    keywords(domain)
        .iter()
        .filter(|kw| normalized.contains(&format!(" {} ", kw)))
        .count()
}

/// The keyword of `domain` that occurs last in normalised text.
pub fn last_keyword(normalized: &str, domain: ChatDomain) -> Option<&'static str> {
    keywords(domain)
        .iter()
        .filter_map(|kw| normalized.rfind(&format!(" {} ", kw)).map(|pos| (pos, *kw)))
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, kw)| kw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_splits_on_punctuation() {
        assert_eq!(normalize("X-Ray, please!"), " x ray please ");
    }

    #[test]
    fn matching_uses_whole_tokens() {
        // "said" contains "ai" but is not the token "ai"
        assert_eq!(count_matches(&normalize("she said hello"), ChatDomain::Technology), 0);
        assert_eq!(count_matches(&normalize("AI is neat"), ChatDomain::Technology), 1);
    }

    #[test]
    fn phrases_match_across_punctuation() {
        let text = normalize("Machine-learning on an x-ray");
        assert_eq!(count_matches(&text, ChatDomain::Technology), 1);
        assert_eq!(count_matches(&text, ChatDomain::Healthcare), 1);
    }

    #[test]
    fn presence_counts_each_keyword_once() {
        assert_eq!(count_matches(&normalize("code code code"), ChatDomain::Technology), 1);
    }

    #[test]
    fn generic_words_belong_to_no_domain() {
        let text = normalize("I need help");
        assert_eq!(count_matches(&text, ChatDomain::Technology), 0);
        assert_eq!(count_matches(&text, ChatDomain::Healthcare), 0);
    }

    #[test]
    fn last_keyword_picks_latest_position() {
        let text = normalize("my doctor ordered an mri");
        assert_eq!(last_keyword(&text, ChatDomain::Healthcare), Some("mri"));
        assert_eq!(last_keyword(&text, ChatDomain::Technology), None);
    }
}
