//! Educational explanations for a diagnosis name.
//!
//! Asks the remote model first; any failure falls back to a small table of
//! known conditions matched by substring, then to a templated explanation.

use serde_json::{Map, Value};

use crate::config;
use crate::models::{dedup_capped, DiagnosisExplanation};
use crate::pipeline::remote::{build_explain_prompt, parse_reply, GenerativeModel};

pub const MIN_EXPLANATION_ITEMS: usize = 3;
pub const MAX_EXPLANATION_ITEMS: usize = 5;

const DEFAULT_DESCRIPTION: &str = "A medical condition that requires veterinary attention.";

const CAUSE_PADDING: &[&str] = &[
    "Various factors may contribute to this condition",
    "Environmental influences",
    "Genetic predisposition",
];

const SYMPTOM_PADDING: &[&str] = &[
    "Changes in appetite or behavior",
    "Worsening symptoms",
    "Signs of discomfort",
];

struct KnownCondition {
    key: &'static str,
    description: &'static str,
    causes: &'static [&'static str],
    symptoms: &'static [&'static str],
}

/// Checked in order; the first key contained in the name wins.
static KNOWN_CONDITIONS: &[KnownCondition] = &[
    KnownCondition {
        key: "alopecia",
        description: "Hair loss in pets that can be caused by various factors including allergies, parasites, infections, or hormonal imbalances.",
        causes: &[
            "Allergic reactions",
            "Parasitic infections (fleas, mites)",
            "Bacterial or fungal infections",
            "Hormonal imbalances",
            "Stress or anxiety",
            "Poor nutrition",
        ],
        symptoms: &[
            "Patchy or complete hair loss",
            "Red or irritated skin",
            "Excessive scratching or licking",
            "Skin lesions or bumps",
            "Changes in skin color or texture",
        ],
    },
    KnownCondition {
        key: "skin infection",
        description: "Bacterial, fungal, or parasitic infections affecting the skin that require veterinary treatment.",
        causes: &[
            "Bacterial overgrowth",
            "Fungal infections",
            "Parasitic infestations",
            "Allergic reactions",
            "Poor hygiene",
            "Compromised immune system",
        ],
        symptoms: &[
            "Red, inflamed skin",
            "Discharge or pus",
            "Foul odor",
            "Excessive scratching",
            "Hair loss around affected areas",
            "Crusty or scaly patches",
        ],
    },
    KnownCondition {
        key: "demodectic mange",
        description: "A skin condition caused by Demodex mites that naturally live on pets but can overpopulate when the immune system is compromised.",
        causes: &[
            "Weakened immune system",
            "Genetic predisposition",
            "Stress",
            "Poor nutrition",
            "Age (young or elderly pets)",
            "Underlying health conditions",
        ],
        symptoms: &[
            "Hair loss in patches",
            "Red, inflamed skin",
            "Scaling or crusty areas",
            "Secondary bacterial infections",
            "Mild to no itching initially",
        ],
    },
    KnownCondition {
        key: "ringworm",
        description: "A fungal infection that affects the skin, hair, and sometimes nails, despite its name having nothing to do with worms.",
        causes: &[
            "Fungal spores in environment",
            "Contact with infected animals",
            "Contaminated objects",
            "Weakened immune system",
            "Poor hygiene",
            "Overcrowded conditions",
        ],
        symptoms: &[
            "Circular patches of hair loss",
            "Red, scaly skin",
            "Broken or brittle hair",
            "Mild itching",
            "Crusty or inflamed areas",
            "Spreading lesions",
        ],
    },
];

const GENERIC_CAUSES: &[&str] = &[
    "Various underlying health factors",
    "Environmental influences",
    "Genetic predisposition",
    "Age-related changes",
    "Lifestyle factors",
];

const GENERIC_SYMPTOMS: &[&str] = &[
    "Changes in appetite or behavior",
    "Worsening of current symptoms",
    "New or unusual symptoms",
    "Signs of pain or discomfort",
    "Any concerning changes in your pet's condition",
];

/// Explain a diagnosis, preferring the remote model when one is configured.
pub fn explain_diagnosis(model: Option<&dyn GenerativeModel>, name: &str) -> DiagnosisExplanation {
    let Some(model) = model else {
        return fallback_explanation(name);
    };

    let reply = model
        .generate_json(&build_explain_prompt(name), None, config::explain_timeout())
        .and_then(|text| parse_reply(&text));

    match reply {
        Ok(map) => normalize_explanation(&map),
        Err(e) => {
            tracing::warn!(error = %e, "Remote explanation failed, using fallback");
            fallback_explanation(name)
        }
    }
}

/// Table lookup by substring, else a templated explanation.
pub fn fallback_explanation(name: &str) -> DiagnosisExplanation {
    let key = name.trim().to_lowercase();
    let to_list = |items: &[&str]| dedup_capped(items.iter().map(|s| s.to_string()), MAX_EXPLANATION_ITEMS);

    if let Some(known) = KNOWN_CONDITIONS.iter().find(|c| key.contains(c.key)) {
        return DiagnosisExplanation {
            description: known.description.to_string(),
            causes: to_list(known.causes),
            symptoms: to_list(known.symptoms),
        };
    }

    let subject = match name.trim() {
        "" => "This condition",
        n => n,
    };
    DiagnosisExplanation {
        description: format!(
            "{subject} is a medical condition that may affect your pet's health. A thorough veterinary examination is recommended for proper diagnosis and treatment planning."
        ),
        causes: to_list(GENERIC_CAUSES),
        symptoms: to_list(GENERIC_SYMPTOMS),
    }
}

/// Coerce a remote explanation payload: lists are trimmed, capped at five
/// and padded to three.
pub fn normalize_explanation(map: &Map<String, Value>) -> DiagnosisExplanation {
    let description = map
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string();

    DiagnosisExplanation {
        description,
        causes: bounded_list(map.get("causes"), CAUSE_PADDING),
        symptoms: bounded_list(map.get("symptoms"), SYMPTOM_PADDING),
    }
}

fn bounded_list(raw: Option<&Value>, padding: &[&str]) -> Vec<String> {
    let items: Vec<String> = match raw {
        Some(Value::Array(values)) => values.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    };

    let mut list = dedup_capped(items, MAX_EXPLANATION_ITEMS);
    for pad in padding {
        if list.len() >= MIN_EXPLANATION_ITEMS {
            break;
        }
        if !list.iter().any(|existing| existing == pad) {
            list.push(pad.to_string());
        }
    }
    list
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
