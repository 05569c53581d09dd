use crate::models::Urgency;

/// Condition entry used to synthesize training text and to dress up a
/// predicted label with causes and a recommendation.
#[derive(Debug)]
pub struct SyntheticProfile {
    pub name: &'static str,
    /// Symptom phrases sampled into synthetic sentences.
    pub symptoms: &'static [&'static str],
    pub urgency: Urgency,
    pub causes: &'static [&'static str],
    pub recommendation: &'static str,
}

pub static SYNTHETIC_PROFILES: &[SyntheticProfile] = &[
    SyntheticProfile {
        name: "Gastrointestinal upset",
        symptoms: &[
            "vomiting",
            "diarrhea",
            "loose stool",
            "nausea",
            "no appetite",
            "abdominal pain",
            "dehydration",
            "lethargy",
        ],
        urgency: Urgency::Medium,
        causes: &["Dietary indiscretion", "Food intolerance", "Mild infection", "Parasites"],
        recommendation: "Offer water, bland food, monitor stool/vomit. Visit vet if symptoms persist over 24 hours.",
    },
    SyntheticProfile {
        name: "Respiratory irritation/infection",
        symptoms: &[
            "cough",
            "sneezing",
            "nasal discharge",
            "wheezing",
            "fever",
            "rapid breathing",
            "congestion",
            "tired",
        ],
        urgency: Urgency::Medium,
        causes: &["Upper respiratory infection", "Allergy", "Airway inflammation"],
        recommendation: "Keep pet warm and hydrated. Seek veterinary exam if breathing effort increases.",
    },
    SyntheticProfile {
        name: "Dermatitis / skin allergy",
        symptoms: &[
            "itchy skin",
            "scratching",
            "rash",
            "red patches",
            "hair loss",
            "licking paws",
            "hot spot",
            "skin irritation",
        ],
        urgency: Urgency::Low,
        causes: &["Flea allergy", "Food allergy", "Environmental allergy", "Skin infection"],
        recommendation: "Prevent scratching, check for fleas, and schedule a skin-focused veterinary check.",
    },
    SyntheticProfile {
        name: "Urinary tract irritation",
        symptoms: &[
            "frequent urination",
            "straining to urinate",
            "blood in urine",
            "painful urination",
            "accidents indoors",
            "licking genitals",
            "small urine amounts",
        ],
        urgency: Urgency::High,
        causes: &["Urinary tract infection", "Bladder inflammation", "Urinary crystals"],
        recommendation: "Increase water intake and consult a vet quickly for urinalysis.",
    },
    SyntheticProfile {
        name: "Musculoskeletal pain/injury",
        symptoms: &[
            "limping",
            "lameness",
            "joint pain",
            "stiffness",
            "difficulty walking",
            "swelling",
            "pain when touched",
            "reduced activity",
        ],
        urgency: Urgency::Medium,
        causes: &["Soft tissue strain", "Joint inflammation", "Trauma"],
        recommendation: "Restrict movement and arrange orthopedic evaluation.",
    },
    SyntheticProfile {
        name: "Fever / systemic infection risk",
        symptoms: &[
            "high fever",
            "extreme lethargy",
            "not eating",
            "shivering",
            "weakness",
            "dehydration",
            "rapid heartbeat",
            "dull behavior",
        ],
        urgency: Urgency::High,
        causes: &["Systemic infection", "Inflammatory condition", "Vector-borne disease"],
        recommendation: "High priority veterinary assessment is recommended as soon as possible.",
    },
];

/// Timing and severity modifiers mixed into every synthetic sentence.
pub static NOISE_TERMS: &[&str] = &[
    "since morning",
    "for two days",
    "after meal",
    "at night",
    "mild",
    "severe",
    "intermittent",
    "progressively worse",
    "sudden",
    "after walk",
];

pub static SPECIES_OPTIONS: &[&str] = &["dog", "cat"];

pub fn find_profile(name: &str) -> Option<&'static SyntheticProfile> {
    SYNTHETIC_PROFILES.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_names_are_unique() {
        let mut names: Vec<_> = SYNTHETIC_PROFILES.iter().map(|p| p.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SYNTHETIC_PROFILES.len());
    }

    #[test]
    fn every_profile_has_enough_vocabulary() {
        for p in SYNTHETIC_PROFILES {
            assert!(p.symptoms.len() >= 4, "{} has too few symptoms", p.name);
            assert!(!p.causes.is_empty());
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(find_profile("Urinary tract irritation").unwrap().urgency, Urgency::High);
        assert!(find_profile("Made up").is_none());
    }
}
