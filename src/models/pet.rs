use serde::{Deserialize, Serialize};

/// Read-only view of the pet a report is about. Owned by the caller's
/// profile store; the triage engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetContext {
    pub name: String,
    pub species: String,
    pub breed: String,
    /// Age in whole years.
    pub age: u32,
    pub medical_notes: Option<String>,
}

impl PetContext {
    pub fn new(name: &str, species: &str, breed: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            species: species.to_string(),
            breed: breed.to_string(),
            age,
            medical_notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.medical_notes = Some(notes.to_string());
        self
    }

    /// Lowercased, trimmed species used for profile matching.
    pub fn species_key(&self) -> String {
        self.species.trim().to_lowercase()
    }
}
