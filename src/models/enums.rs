use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct EnumParseError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serialized as the display string, not the variant name.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EnumParseError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Urgency {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Emergency => "Emergency",
    NotAssessed => "Not Assessed",
    ServiceUnavailable => "Service Unavailable",
    Unknown => "Unknown",
});

str_enum!(ModelTag {
    RemoteModel => "Gemini-Remote-v1",
    Prototype => "KNN-Symptom-Prototype-v1",
    Statistical => "RandomForest-Synthetic-v1",
    SafeDefault => "Safe-Default",
    Unspecified => "Unspecified",
});

impl Urgency {
    /// Lenient parse for labels coming from external models.
    /// Case, surrounding whitespace and `_`/`-` separators are ignored.
    /// Anything unrecognized maps to `Unknown`.
    pub fn parse_lenient(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        match key.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "low" => Self::Low,
            "medium" | "moderate" => Self::Medium,
            "high" => Self::High,
            "emergency" => Self::Emergency,
            "not assessed" => Self::NotAssessed,
            "service unavailable" => Self::ServiceUnavailable,
            _ => Self::Unknown,
        }
    }

    /// Map a clinical severity label onto an urgency tier.
    /// Accepts the urgency names themselves plus mild, severe, urgent and critical.
    pub fn from_severity(raw: &str) -> Self {
        match Self::parse_lenient(raw) {
            Self::Unknown => match raw.trim().to_ascii_lowercase().as_str() {
                "mild" | "minor" => Self::Low,
                "severe" | "urgent" | "serious" => Self::High,
                "critical" | "life threatening" | "life-threatening" => Self::Emergency,
                _ => Self::Unknown,
            },
            tier => tier,
        }
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Default for ModelTag {
    fn default() -> Self {
        Self::Unspecified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn urgency_round_trips_display_strings() {
        for u in [
            Urgency::Low,
            Urgency::Medium,
            Urgency::High,
            Urgency::Emergency,
            Urgency::NotAssessed,
            Urgency::ServiceUnavailable,
            Urgency::Unknown,
        ] {
            assert_eq!(Urgency::from_str(u.as_str()).unwrap(), u);
        }
    }

    #[test]
    fn urgency_strict_parse_rejects_lowercase() {
        let err = Urgency::from_str("low").unwrap_err();
        assert_eq!(err.field, "Urgency");
        assert_eq!(err.value, "low");
    }

    #[test]
    fn urgency_lenient_parse() {
        assert_eq!(Urgency::parse_lenient("  HIGH "), Urgency::High);
        assert_eq!(Urgency::parse_lenient("not_assessed"), Urgency::NotAssessed);
        assert_eq!(Urgency::parse_lenient("Service-Unavailable"), Urgency::ServiceUnavailable);
        assert_eq!(Urgency::parse_lenient("Moderate"), Urgency::Medium);
        assert_eq!(Urgency::parse_lenient("catastrophic"), Urgency::Unknown);
        assert_eq!(Urgency::parse_lenient(""), Urgency::Unknown);
    }

    #[test]
    fn severity_words_map_to_tiers() {
        assert_eq!(Urgency::from_severity("Mild"), Urgency::Low);
        assert_eq!(Urgency::from_severity("moderate"), Urgency::Medium);
        assert_eq!(Urgency::from_severity(" Severe "), Urgency::High);
        assert_eq!(Urgency::from_severity("URGENT"), Urgency::High);
        assert_eq!(Urgency::from_severity("Critical"), Urgency::Emergency);
        assert_eq!(Urgency::from_severity("High"), Urgency::High);
        assert_eq!(Urgency::from_severity("Unknown"), Urgency::Unknown);
        assert_eq!(Urgency::from_severity("catastrophic"), Urgency::Unknown);
        // Severity vocabulary stays out of the plain urgency parser.
        assert_eq!(Urgency::parse_lenient("Severe"), Urgency::Unknown);
    }

    #[test]
    fn urgency_serializes_as_label() {
        let json = serde_json::to_string(&Urgency::ServiceUnavailable).unwrap();
        assert_eq!(json, "\"Service Unavailable\"");
        let back: Urgency = serde_json::from_str("\"Not Assessed\"").unwrap();
        assert_eq!(back, Urgency::NotAssessed);
    }

    #[test]
    fn model_tag_display() {
        assert_eq!(ModelTag::Prototype.to_string(), "KNN-Symptom-Prototype-v1");
        assert_eq!(ModelTag::default(), ModelTag::Unspecified);
    }
}
