use crate::models::PetContext;

pub const SYMPTOM_SYSTEM_PROMPT: &str = "You are a veterinary AI assistant. Analyze the provided pet symptoms and provide \
a list of possible diagnoses (minimum 1, maximum 5), urgency level (Low, Medium, High, Emergency), \
recommendations, and possible causes. \
Be thorough but remember this is not a replacement for professional veterinary care. \
Always recommend consulting a veterinarian for serious concerns. \
Respond ONLY with JSON in this format: \
{\"diagnosis\": [\"string1\", \"string2\"], \"urgency_level\": \"string\", \"recommendation\": \"string\", \"possible_causes\": [\"string1\", \"string2\"]}";

pub const IMAGE_SYSTEM_PROMPT: &str = r#"You are a veterinary AI assistant specializing in visual pet health assessment.
First task: verify whether the uploaded image matches the selected pet profile (species, breed and approximate age).

DECISION RULES:
- If species or visual context clearly does NOT match the selected pet, set image_match=false.
- If breed or apparent age is inconsistent with the profile, set image_match=false and explain in mismatch_reason.
- If the image is not a pet, or is unclear or unusable, set image_match=false.
- On a mismatch, put a short warning starting with "Warning:" as the FIRST item of "diagnosis".
- If image_match=false, leave the analysis fields empty and set urgency_level to "Not Assessed".

Otherwise give a concise ranked list of possible diagnoses (names only, no "Most likely"),
possible underlying causes, a clear recommendation and how likely the condition is.

Respond ONLY with valid JSON in this exact schema:
{
  "image_match": true,
  "mismatch_reason": "string",
  "diagnosis": ["string"],
  "condition_likelihood": "string",
  "recommendation": "string",
  "urgency_level": "Low|Medium|High|Emergency|Not Assessed",
  "possible_causes": ["string"]
}"#;

pub const EXPLAIN_SYSTEM_PROMPT: &str = "You are a veterinary education assistant. Provide a detailed, educational explanation \
about the given pet health diagnosis. Be informative but remember this is for educational \
purposes only and should not replace professional veterinary care. \
Respond ONLY with JSON in this exact format: \
{\"description\": \"string\", \"causes\": [\"string1\", \"string2\", \"string3\"], \"symptoms\": [\"string1\", \"string2\", \"string3\"]}";

fn pet_block(pet: &PetContext) -> String {
    let notes = pet
        .medical_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("None");
    format!(
        "Pet Information:\n\
         - Name: {}\n\
         - Species: {}\n\
         - Breed: {}\n\
         - Age: {} years\n\
         - Medical Notes: {}",
        pet.name, pet.species, pet.breed, pet.age, notes
    )
}

/// Prompt for the symptom schema.
pub fn build_symptom_prompt(pet: &PetContext, symptoms: &str) -> String {
    format!(
        "{SYMPTOM_SYSTEM_PROMPT}\n\n{}\n\nCurrent Symptoms: {}\n\nPlease analyze these symptoms and provide your assessment.",
        pet_block(pet),
        symptoms.trim()
    )
}

/// Prompt for the image schema.
pub fn build_image_prompt(pet: &PetContext, description: &str) -> String {
    let description = match description.trim() {
        "" => "No additional description provided",
        d => d,
    };
    format!(
        "{IMAGE_SYSTEM_PROMPT}\n\n{}\n\nAdditional Description: {description}\n\nPlease analyze the image and provide your assessment.",
        pet_block(pet)
    )
}

/// Prompt for a diagnosis explanation.
pub fn build_explain_prompt(diagnosis_name: &str) -> String {
    format!(
        "{EXPLAIN_SYSTEM_PROMPT}\n\n\
         Please provide a comprehensive explanation for the following pet health diagnosis: \"{}\"\n\n\
         Include:\n\
         1. A clear description of what this condition is\n\
         2. Common causes that lead to this condition (provide 3-5 causes)\n\
         3. Symptoms and signs pet owners should watch out for (provide 3-5 symptoms)\n\n\
         Make the explanation informative but accessible to pet owners.",
        diagnosis_name.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symptom_prompt_lists_pet_and_symptoms() {
        let pet = PetContext::new("Rex", "Dog", "Labrador", 5);
        let p = build_symptom_prompt(&pet, "  vomiting since morning ");
        assert!(p.starts_with(SYMPTOM_SYSTEM_PROMPT));
        assert!(p.contains("- Name: Rex"));
        assert!(p.contains("- Age: 5 years"));
        assert!(p.contains("- Medical Notes: None"));
        assert!(p.contains("Current Symptoms: vomiting since morning\n"));
    }

    #[test]
    fn medical_notes_included_when_present() {
        let pet = PetContext::new("Rex", "Dog", "Labrador", 5).with_notes("diabetic");
        assert!(build_symptom_prompt(&pet, "x").contains("- Medical Notes: diabetic"));
    }

    #[test]
    fn image_prompt_defaults_description() {
        let pet = PetContext::new("Milo", "Cat", "Siamese", 2);
        let p = build_image_prompt(&pet, "   ");
        assert!(p.contains("Additional Description: No additional description provided"));
        assert!(p.contains("image_match"));
        assert!(p.contains("mismatch_reason"));
    }

    #[test]
    fn explain_prompt_quotes_name() {
        let p = build_explain_prompt(" Ringworm ");
        assert!(p.contains("diagnosis: \"Ringworm\""));
        assert!(p.contains("3-5 causes"));
    }
}
