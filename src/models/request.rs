use std::fmt;

use super::pet::PetContext;

/// Raw image bytes plus the MIME type the remote model should be told.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(data: Vec<u8>, mime_type: &str) -> Self {
        let mime_type = match mime_type.trim() {
            "" => "image/jpeg".to_string(),
            m => m.to_string(),
        };
        Self { mime_type, data }
    }
}

// Image payloads can be megabytes; keep them out of debug output.
impl fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// One triage request as seen by every backend tier.
#[derive(Debug, Clone)]
pub enum AnalysisRequest<'a> {
    Symptoms {
        pet: &'a PetContext,
        symptoms: &'a str,
    },
    Image {
        pet: &'a PetContext,
        image: &'a InlineImage,
        description: &'a str,
    },
}

impl<'a> AnalysisRequest<'a> {
    pub fn pet(&self) -> &'a PetContext {
        match self {
            Self::Symptoms { pet, .. } | Self::Image { pet, .. } => *pet,
        }
    }

    /// Free text the local classifiers can score: the symptom report, or the
    /// owner's description for an image.
    pub fn text(&self) -> &'a str {
        match self {
            Self::Symptoms { symptoms, .. } => *symptoms,
            Self::Image { description, .. } => *description,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}
