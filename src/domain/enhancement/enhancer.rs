//! Response post-processing pipeline.
//!
//! Stages run in a fixed order: personality starter, base content, light
//! remark, milestone suggestion, feature footnotes, routing summary. Only the
//! starter consumes randomness.

use crate::domain::conversation::{CostLatencyEstimate, TriageResult};
use crate::domain::settings::TurnFeatures;

use super::PersonalityPicker;

/// Light-hearted closers for relaxed, low-urgency questions.
pub const REMARKS: &[&str] = &[
    "Hope that makes your day a little easier.",
    "Not bad for a bunch of matrix multiplications, right?",
    "Let me know if you want the extended director's cut.",
    "No robots were harmed in the making of this answer.",
    "Happy exploring!",
];

/// Per-turn inputs that shape the decorations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancementContext {
    pub model_used: String,
    pub requested_model: Option<String>,
    pub estimates: Option<CostLatencyEstimate>,
    pub suggestion: Option<String>,
    pub features: TurnFeatures,
}

#[derive(Debug, Clone)]
pub struct ResponseEnhancer {
    personality: PersonalityPicker,
}

impl ResponseEnhancer {
    pub fn new(personality: PersonalityPicker) -> Self {
        Self { personality }
    }

    /// Full pipeline, including the random starter.
    pub fn enhance(
        &mut self,
        raw_content: &str,
        triage: Option<&TriageResult>,
        context: &EnhancementContext,
    ) -> String {
        let body = Self::compose(raw_content, triage, context);
        match self.personality.pick() {
            Some(starter) => format!("{} {}", starter, body),
            None => body,
        }
    }

    /// Every stage except the starter. Pure.
    pub fn compose(
        raw_content: &str,
        triage: Option<&TriageResult>,
        context: &EnhancementContext,
    ) -> String {
        let mut sections = vec![raw_content.trim_end().to_string()];

        if let Some(remark) = triage.and_then(|t| Self::remark(raw_content, t)) {
            sections.push(remark.to_string());
        }
        if let Some(suggestion) = &context.suggestion {
            sections.push(format!("**Next step:** {}", suggestion));
        }
        let footnotes = Self::footnotes(&context.features);
        if !footnotes.is_empty() {
            sections.push(footnotes.join("\n"));
        }
        if let Some(triage) = triage {
            sections.push(Self::routing_summary(triage, context));
        }

        sections.join("\n\n")
    }

    fn remark(raw_content: &str, triage: &TriageResult) -> Option<&'static str> {
        if !triage.is_relaxed() {
            return None;
        }
        Some(REMARKS[raw_content.chars().count() % REMARKS.len()])
    }

    fn footnotes(features: &TurnFeatures) -> Vec<&'static str> {
        let mut notes = Vec::new();
        if features.knowledge_base {
            notes.push("_Grounded in the curated knowledge base._");
        }
        if features.rag {
            notes.push("_Retrieved documents informed this answer._");
        }
        if features.web_search {
            notes.push("_Live web search results were consulted._");
        }
        if features.tool_access {
            notes.push("_External tools were available for this answer._");
        }
        notes
    }

    fn routing_summary(triage: &TriageResult, context: &EnhancementContext) -> String {
        let mut lines = vec!["**Routing summary**".to_string()];

        match context.requested_model.as_deref() {
            Some(requested) if requested != context.model_used => lines.push(format!(
                "- Model: {} (requested {})",
                context.model_used, requested
            )),
            _ => lines.push(format!("- Model: {}", context.model_used)),
        }

        if let Some(estimates) = &context.estimates {
            let mut cost = format!("- Est. cost: ${:.4}", estimates.cost_usd);
            if let Some(delta) = estimates.cost_delta_usd() {
                if delta >= 0.0 {
                    cost.push_str(&format!(" (saves ${:.4} vs baseline)", delta));
                } else {
                    cost.push_str(&format!(" (${:.4} more than baseline)", -delta));
                }
            }
            lines.push(cost);

            let mut latency = format!("- Est. latency: {} ms", estimates.latency_ms);
            if let Some(delta) = estimates.latency_delta_ms() {
                if delta >= 0 {
                    latency.push_str(&format!(" ({} ms faster)", delta));
                } else {
                    latency.push_str(&format!(" ({} ms slower)", -delta));
                }
            }
            lines.push(latency);
        }

        lines.push(format!(
            "- Query: {} | {} | {} urgency",
            triage.complexity, triage.domain, triage.urgency
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{Complexity, DisplayFormat, EmotionalTone, Urgency};
    use proptest::prelude::*;

    fn triage(urgency: Urgency, tone: EmotionalTone) -> TriageResult {
        TriageResult::new(
            Complexity::Moderate,
            "technology",
            urgency,
            DisplayFormat::Text,
            tone,
            false,
            0.9,
            Some("gpt-4o".into()),
        )
        .unwrap()
    }

    fn context() -> EnhancementContext {
        EnhancementContext {
            model_used: "gpt-4o-mini".into(),
            ..EnhancementContext::default()
        }
    }

    #[test]
    fn plain_reply_without_triage_is_unchanged() {
        let out = ResponseEnhancer::compose("Hello.", None, &context());
        assert_eq!(out, "Hello.");
    }

    #[test]
    fn relaxed_triage_adds_a_remark() {
        let t = triage(Urgency::Low, EmotionalTone::Positive);
        let out = ResponseEnhancer::compose("Hello.", Some(&t), &context());
        assert!(out.contains(REMARKS["Hello.".len() % REMARKS.len()]));
    }

    #[test]
    fn urgent_triage_gets_no_remark() {
        let t = triage(Urgency::Critical, EmotionalTone::Neutral);
        let out = ResponseEnhancer::compose("Hello.", Some(&t), &context());
        assert!(REMARKS.iter().all(|r| !out.contains(r)));
    }

    #[test]
    fn stages_appear_in_fixed_order() {
        let t = triage(Urgency::Low, EmotionalTone::Neutral);
        let ctx = EnhancementContext {
            model_used: "gpt-4o-mini".into(),
            requested_model: Some("gpt-4o".into()),
            estimates: Some(CostLatencyEstimate {
                cost_usd: 0.002,
                latency_ms: 800,
                baseline_cost_usd: Some(0.01),
                baseline_latency_ms: Some(1_200),
            }),
            suggestion: Some("Want an implementation plan?".into()),
            features: TurnFeatures {
                knowledge_base: true,
                rag: true,
                ..TurnFeatures::default()
            },
        };

        let out = ResponseEnhancer::compose("Body", Some(&t), &ctx);

        let body = out.find("Body").unwrap();
        let remark = out.find(REMARKS[4 % REMARKS.len()]).unwrap();
        let suggestion = out.find("Want an implementation plan?").unwrap();
        let footnote = out.find("knowledge base").unwrap();
        let summary = out.find("Routing summary").unwrap();
        assert!(body < remark && remark < suggestion && suggestion < footnote && footnote < summary);
        assert!(out.contains("gpt-4o-mini (requested gpt-4o)"));
        assert!(out.contains("saves $0.0080"));
        assert!(out.contains("400 ms faster"));
        assert!(out.contains("moderate | technology | low urgency"));
    }

    #[test]
    fn zero_probability_enhance_matches_compose() {
        let mut enhancer = ResponseEnhancer::new(PersonalityPicker::disabled());
        let t = triage(Urgency::Medium, EmotionalTone::Curious);
        assert_eq!(
            enhancer.enhance("x", Some(&t), &context()),
            ResponseEnhancer::compose("x", Some(&t), &context())
        );
    }

    proptest! {
        #[test]
        fn fixed_seed_pipeline_is_deterministic(
            content in ".{0,200}",
            seed in any::<u64>(),
            low in any::<bool>(),
        ) {
            let t = triage(if low { Urgency::Low } else { Urgency::High }, EmotionalTone::Neutral);
            let mut a = ResponseEnhancer::new(PersonalityPicker::new(Some(seed), 0.5));
            let mut b = ResponseEnhancer::new(PersonalityPicker::new(Some(seed), 0.5));
            for _ in 0..3 {
                prop_assert_eq!(
                    a.enhance(&content, Some(&t), &context()),
                    b.enhance(&content, Some(&t), &context())
                );
            }
        }

        #[test]
        fn compose_is_idempotent_per_input(content in ".{0,200}") {
            let t = triage(Urgency::Low, EmotionalTone::Positive);
            prop_assert_eq!(
                ResponseEnhancer::compose(&content, Some(&t), &context()),
                ResponseEnhancer::compose(&content, Some(&t), &context())
            );
        }
    }
}
