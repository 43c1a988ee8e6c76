//! Model id to provider mapping and complementary model selection.

use super::ProviderTag;

/// Models tried, in order, when picking a second opinion for split screen.
pub const COMPLEMENT_PRECEDENCE: [&str; 3] =
    ["claude-3-5-sonnet-latest", "gpt-4o", "gemini-1.5-pro"];

const VENDOR_MARKERS: &[(&str, ProviderTag)] = &[
    ("claude", ProviderTag::Anthropic),
    ("anthropic", ProviderTag::Anthropic),
    ("gemini", ProviderTag::Google),
    ("gemma", ProviderTag::Google),
    ("google", ProviderTag::Google),
    ("mistral", ProviderTag::Mistral),
    ("mixtral", ProviderTag::Mistral),
    ("codestral", ProviderTag::Mistral),
    ("deepseek", ProviderTag::DeepSeek),
    ("llama", ProviderTag::Meta),
    ("grok", ProviderTag::Xai),
    ("gpt", ProviderTag::OpenAi),
    ("openai", ProviderTag::OpenAi),
];

const OPENAI_REASONING_PREFIXES: &[&str] = &["o1", "o3", "o4"];

/// Pure, case-insensitive vendor-name matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRouter {
    fallback: ProviderTag,
}

impl ModelRouter {
    pub fn new(fallback: ProviderTag) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> ProviderTag {
        self.fallback
    }

    /// Provider family for `model_id`; unknown ids map to the fallback.
    pub fn provider_for(&self, model_id: &str) -> ProviderTag {
        let id = model_id.trim().to_lowercase();
        // Strip a gateway-style "vendor/" namespace before checking prefixes.
        let bare = id.rsplit('/').next().unwrap_or(id.as_str());

        if let Some((_, tag)) = VENDOR_MARKERS.iter().find(|(marker, _)| id.contains(marker)) {
            return *tag;
        }
        if OPENAI_REASONING_PREFIXES.iter().any(|p| bare.starts_with(p)) {
            return ProviderTag::OpenAi;
        }
        self.fallback
    }

    /// First model in the precedence table from a different provider than
    /// `model_id`.
    pub fn complement_of(&self, model_id: &str) -> String {
        let primary = self.provider_for(model_id);
        COMPLEMENT_PRECEDENCE
            .iter()
            .find(|candidate| self.provider_for(candidate) != primary)
            .unwrap_or(&COMPLEMENT_PRECEDENCE[0])
            .to_string()
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new(ProviderTag::OpenAi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_vendor_substring() {
        let router = ModelRouter::default();
        assert_eq!(router.provider_for("claude-3-5-sonnet-latest"), ProviderTag::Anthropic);
        assert_eq!(router.provider_for("gpt-4o-mini"), ProviderTag::OpenAi);
        assert_eq!(router.provider_for("gemini-1.5-pro"), ProviderTag::Google);
        assert_eq!(router.provider_for("mixtral-8x7b"), ProviderTag::Mistral);
        assert_eq!(router.provider_for("deepseek-chat"), ProviderTag::DeepSeek);
        assert_eq!(router.provider_for("meta-llama/llama-3-70b"), ProviderTag::Meta);
        assert_eq!(router.provider_for("grok-2"), ProviderTag::Xai);
    }

    #[test]
    fn routing_is_case_insensitive() {
        let router = ModelRouter::default();
        assert_eq!(router.provider_for("Claude-3-Opus"), ProviderTag::Anthropic);
        assert_eq!(router.provider_for("GPT-4"), ProviderTag::OpenAi);
    }

    #[test]
    fn reasoning_models_route_to_openai() {
        let router = ModelRouter::new(ProviderTag::Google);
        assert_eq!(router.provider_for("o1-preview"), ProviderTag::OpenAi);
        assert_eq!(router.provider_for("openai/o3-mini"), ProviderTag::OpenAi);
    }

    #[test]
    fn unknown_models_use_fallback() {
        assert_eq!(ModelRouter::default().provider_for("qwen-72b"), ProviderTag::OpenAi);
        assert_eq!(
            ModelRouter::new(ProviderTag::Anthropic).provider_for("qwen-72b"),
            ProviderTag::Anthropic
        );
    }

    #[test]
    fn complement_picks_first_model_from_another_provider() {
        let router = ModelRouter::default();
        assert_eq!(router.complement_of("gpt-4o-mini"), "claude-3-5-sonnet-latest");
        assert_eq!(router.complement_of("claude-3-haiku"), "gpt-4o");
        assert_eq!(router.complement_of("gemini-1.5-flash"), "claude-3-5-sonnet-latest");
    }

    #[test]
    fn complement_never_shares_provider() {
        let router = ModelRouter::default();
        for model in ["gpt-4o", "claude-3-opus", "gemini-pro", "llama-3", "unknown"] {
            let complement = router.complement_of(model);
            assert_ne!(router.provider_for(&complement), router.provider_for(model));
        }
    }
}
