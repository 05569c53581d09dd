//! Prototype scoring classifier.
//!
//! Zero-training, keyword-weighted similarity against a small curated set of
//! condition profiles. Multi-word phrases are tested by substring
//! containment, single words by token membership.

use std::cmp::Ordering;

use crate::models::{dedup_capped, AnalysisResult, ModelTag, PetContext, Urgency, MAX_POSSIBLE_CAUSES};
use crate::pipeline::error::TriageError;
use crate::pipeline::safety::urgency_for;
use crate::pipeline::text::{normalize_text, token_set};

/// Multiplier when the pet's species is in the profile's species set.
pub const SPECIES_MATCH_BOOST: f32 = 1.1;

/// Multiplier when it is not.
pub const SPECIES_MISMATCH_PRIOR: f32 = 0.95;

pub const DEFAULT_TOP_K: usize = 3;

/// Static description of one recognizable condition.
#[derive(Debug)]
pub struct ConditionProfile {
    pub name: &'static str,
    pub species: &'static [&'static str],
    /// Keyword or phrase (already normalized) → positive weight.
    pub keywords: &'static [(&'static str, f32)],
    pub causes: &'static [&'static str],
    pub recommendation: &'static str,
    pub baseline_urgency: Urgency,
}

pub static CONDITION_PROFILES: &[ConditionProfile] = &[
    ConditionProfile {
        name: "Gastrointestinal upset",
        species: &["dog", "cat"],
        keywords: &[
            ("vomit", 2.0),
            ("vomiting", 2.0),
            ("diarrhea", 2.0),
            ("loose stool", 1.6),
            ("nausea", 1.4),
            ("no appetite", 1.8),
            ("dehydration", 1.6),
            ("abdominal pain", 1.5),
        ],
        causes: &["Dietary change", "Mild infection", "Food intolerance", "Parasitic irritation"],
        recommendation: "Offer fluids, bland diet, monitor stool/vomit frequency; seek vet care if persistent >24h.",
        baseline_urgency: Urgency::Medium,
    },
    ConditionProfile {
        name: "Respiratory irritation/infection",
        species: &["dog", "cat"],
        keywords: &[
            ("cough", 2.0),
            ("sneeze", 1.8),
            ("sneezing", 1.8),
            ("nasal discharge", 2.0),
            ("wheeze", 1.8),
            ("breathing", 1.6),
            ("panting", 1.2),
            ("congestion", 1.5),
            ("fever", 1.3),
        ],
        causes: &["Upper respiratory infection", "Allergic irritation", "Airway inflammation"],
        recommendation: "Keep environment calm and dust-free; monitor breathing effort; consult a vet if worsening.",
        baseline_urgency: Urgency::Medium,
    },
    ConditionProfile {
        name: "Dermatitis / skin allergy",
        species: &["dog", "cat"],
        keywords: &[
            ("itch", 2.0),
            ("itchy", 2.0),
            ("scratch", 1.9),
            ("rash", 1.8),
            ("redness", 1.6),
            ("hair loss", 1.9),
            ("skin", 1.4),
            ("hot spot", 1.8),
            ("licking paws", 1.7),
        ],
        causes: &[
            "Environmental allergy",
            "Flea sensitivity",
            "Contact dermatitis",
            "Secondary skin infection",
        ],
        recommendation: "Prevent self-trauma, check for fleas, and schedule dermatology-focused vet evaluation.",
        baseline_urgency: Urgency::Low,
    },
    ConditionProfile {
        name: "Urinary tract irritation",
        species: &["dog", "cat"],
        keywords: &[
            ("frequent urination", 2.0),
            ("urinate", 1.8),
            ("straining", 2.0),
            ("blood urine", 2.0),
            ("accidents", 1.5),
            ("pain urination", 2.0),
            ("litter box", 1.4),
        ],
        causes: &["Urinary infection", "Crystals/stones", "Bladder inflammation"],
        recommendation: "Increase water access and seek prompt veterinary urinalysis.",
        baseline_urgency: Urgency::High,
    },
    ConditionProfile {
        name: "Musculoskeletal pain/injury",
        species: &["dog", "cat"],
        keywords: &[
            ("limp", 2.0),
            ("lameness", 2.0),
            ("joint pain", 1.9),
            ("stiff", 1.6),
            ("not walking", 2.0),
            ("swelling", 1.5),
            ("injury", 1.8),
            ("fracture", 2.0),
            ("sprain", 1.6),
        ],
        causes: &["Soft tissue strain", "Joint inflammation", "Trauma"],
        recommendation: "Restrict activity and arrange orthopedic exam, especially if non-weight-bearing.",
        baseline_urgency: Urgency::Medium,
    },
];

/// A profile with its accumulated, species-adjusted score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCondition {
    pub profile: &'static ConditionProfile,
    pub score: f32,
}

/// Keyword-prototype scorer over a static profile table.
pub struct PrototypeClassifier {
    profiles: &'static [ConditionProfile],
    k: usize,
}

impl Default for PrototypeClassifier {
    fn default() -> Self {
        Self::new(CONDITION_PROFILES, DEFAULT_TOP_K)
    }
}

impl PrototypeClassifier {
    pub fn new(profiles: &'static [ConditionProfile], k: usize) -> Self {
        Self {
            profiles,
            k: k.max(1),
        }
    }

    /// Positive-scoring profiles, best first. Equal scores are ordered by
    /// profile name so the ranking never depends on table order.
    pub fn rank(&self, species: &str, normalized_text: &str) -> Vec<ScoredCondition> {
        let tokens = token_set(normalized_text);

        let mut scored: Vec<ScoredCondition> = self
            .profiles
            .iter()
            .filter_map(|profile| {
                let raw: f32 = profile
                    .keywords
                    .iter()
                    .filter(|(phrase, _)| {
                        if phrase.contains(' ') {
                            normalized_text.contains(phrase)
                        } else {
                            tokens.contains(phrase)
                        }
                    })
                    .map(|(_, weight)| weight)
                    .sum();
                let prior = if profile.species.contains(&species) {
                    SPECIES_MATCH_BOOST
                } else {
                    SPECIES_MISMATCH_PRIOR
                };
                let score = raw * prior;
                (score > 0.0).then_some(ScoredCondition { profile, score })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.profile.name.cmp(b.profile.name))
        });
        scored
    }

    /// Score symptom text; `EmptyMatch` when no profile scores above zero.
    pub fn try_score(&self, pet: &PetContext, symptoms: &str) -> Result<AnalysisResult, TriageError> {
        let text = normalize_text(symptoms);
        let ranked = self.rank(&pet.species_key(), &text);
        let top: Vec<ScoredCondition> = ranked.into_iter().take(self.k).collect();

        let Some(best) = top.first() else {
            return Err(TriageError::EmptyMatch);
        };

        let causes = top
            .iter()
            .flat_map(|s| s.profile.causes.iter().map(|c| c.to_string()));

        tracing::debug!(
            top = best.profile.name,
            top_score = best.score,
            matched = top.len(),
            "Prototype scoring complete"
        );

        Ok(AnalysisResult {
            diagnosis: top.iter().map(|s| s.profile.name.to_string()).collect(),
            urgency_level: urgency_for(&text, best.score),
            recommendation: best.profile.recommendation.to_string(),
            possible_causes: dedup_capped(causes, MAX_POSSIBLE_CAUSES),
            model_used: ModelTag::Prototype,
            ..AnalysisResult::default()
        })
    }

    /// Score symptom text, falling back to a generic result when nothing matched.
    pub fn score(&self, pet: &PetContext, symptoms: &str) -> AnalysisResult {
        self.try_score(pet, symptoms)
            .unwrap_or_else(|_| non_specific_result())
    }
}

/// Result for text no profile recognizes.
pub fn non_specific_result() -> AnalysisResult {
    AnalysisResult {
        diagnosis: vec!["General non-specific symptoms".into()],
        urgency_level: Urgency::Medium,
        recommendation: "Monitor closely and consult a veterinarian if symptoms persist or worsen.".into(),
        possible_causes: vec!["Multiple possible causes; further clinical exam required".into()],
        model_used: ModelTag::Prototype,
        ..AnalysisResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog() -> PetContext {
        PetContext::new("Rex", "dog", "Labrador", 5)
    }

    #[test]
    fn vomiting_and_diarrhea_is_gi_medium() {
        let clf = PrototypeClassifier::default();
        let r = clf.score(&dog(), "dog vomiting and diarrhea since morning");
        assert_eq!(r.diagnosis[0], "Gastrointestinal upset");
        assert_eq!(r.urgency_level, Urgency::Medium);
        assert_eq!(r.model_used, ModelTag::Prototype);
        assert_eq!(
            r.recommendation,
            "Offer fluids, bland diet, monitor stool/vomit frequency; seek vet care if persistent >24h."
        );
    }

    #[test]
    fn gi_score_is_boosted_sum() {
        let clf = PrototypeClassifier::default();
        let ranked = clf.rank("dog", &normalize_text("dog vomiting and diarrhea since morning"));
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - 4.4).abs() < 1e-4);
    }

    #[test]
    fn species_outside_profile_gets_lower_prior() {
        let clf = PrototypeClassifier::default();
        let ranked = clf.rank("rabbit", &normalize_text("cough"));
        assert!((ranked[0].score - 2.0 * SPECIES_MISMATCH_PRIOR).abs() < 1e-4);
    }

    #[test]
    fn unmatched_text_is_non_specific() {
        let clf = PrototypeClassifier::default();
        let r = clf.score(&dog(), "xyzzy");
        assert_eq!(r.diagnosis, vec!["General non-specific symptoms"]);
        assert_eq!(r.urgency_level, Urgency::Medium);
        assert!(matches!(clf.try_score(&dog(), "xyzzy"), Err(TriageError::EmptyMatch)));
    }

    #[test]
    fn red_flag_forces_high() {
        let clf = PrototypeClassifier::default();
        let r = clf.score(&dog(), "slight cough, then a seizure");
        assert_eq!(r.urgency_level, Urgency::High);
    }

    #[test]
    fn single_word_keywords_need_whole_tokens() {
        let clf = PrototypeClassifier::default();
        // "skinny" must not count as "skin"
        assert!(clf.rank("dog", &normalize_text("very skinny")).is_empty());
    }

    #[test]
    fn top_k_and_cause_cap() {
        let clf = PrototypeClassifier::default();
        let r = clf.score(
            &dog(),
            "vomiting, cough, itchy rash, limp and straining to urinate",
        );
        assert_eq!(r.diagnosis.len(), 3);
        assert!(r.possible_causes.len() <= MAX_POSSIBLE_CAUSES);
        let mut seen = std::collections::HashSet::new();
        assert!(r.possible_causes.iter().all(|c| seen.insert(c.clone())));
    }

    #[test]
    fn high_score_without_red_flag_is_high() {
        let clf = PrototypeClassifier::default();
        // itch + itchy + scratch + rash + redness = 9.3, x1.1
        let r = clf.score(&dog(), "itch itchy scratch rash redness");
        assert_eq!(r.diagnosis[0], "Dermatitis / skin allergy");
        assert_eq!(r.urgency_level, Urgency::High);
    }

    #[test]
    fn ties_break_by_name() {
        let clf = PrototypeClassifier::default();
        // cough (2.0, respiratory) vs limp (2.0, musculoskeletal)
        let ranked = clf.rank("dog", &normalize_text("cough limp"));
        assert_eq!(ranked[0].profile.name, "Musculoskeletal pain/injury");
        assert_eq!(ranked[1].profile.name, "Respiratory irritation/infection");
    }

    #[test]
    fn k_limits_diagnosis_count() {
        let clf = PrototypeClassifier::new(CONDITION_PROFILES, 1);
        let r = clf.score(&dog(), "cough and vomiting");
        assert_eq!(r.diagnosis.len(), 1);
    }
}
