use serde_json::{Map, Value};

use crate::pipeline::error::TriageError;

/// Parse the model's reply text into a JSON object. Tolerates a
/// ```` ```json ```` fence around the object.
pub fn parse_reply(text: &str) -> Result<Map<String, Value>, TriageError> {
    let body = strip_code_fence(text.trim());
    let value: Value =
        serde_json::from_str(body).map_err(|e| TriageError::JsonParsing(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(TriageError::MalformedResponse(format!(
            "Expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Symptom-schema reply: must carry a `diagnosis` key.
pub fn parse_symptom_reply(text: &str) -> Result<Value, TriageError> {
    let map = parse_reply(text)?;
    require_key(&map, "diagnosis")?;
    Ok(Value::Object(map))
}

/// Image-schema reply: needs `diagnosis`, unless the model reported a
/// mismatch through `image_match`.
pub fn parse_image_reply(text: &str) -> Result<Value, TriageError> {
    let map = parse_reply(text)?;
    if !map.contains_key("image_match") {
        require_key(&map, "diagnosis")?;
    }
    Ok(Value::Object(map))
}

fn require_key(map: &Map<String, Value>, key: &str) -> Result<(), TriageError> {
    if map.contains_key(key) {
        Ok(())
    } else {
        Err(TriageError::MalformedResponse(format!("Missing key '{key}'")))
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        let v = parse_symptom_reply(r#"{"diagnosis": ["Otitis"], "urgency_level": "Low"}"#).unwrap();
        assert_eq!(v["diagnosis"][0], "Otitis");
    }

    #[test]
    fn fenced_object() {
        let v = parse_reply("```json\n{\"diagnosis\": []}\n```").unwrap();
        assert!(v.contains_key("diagnosis"));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = parse_reply("not json at all").unwrap_err();
        assert!(matches!(err, TriageError::JsonParsing(_)));
        assert!(err.is_parse_error());
    }

    #[test]
    fn array_is_malformed() {
        let err = parse_reply("[1, 2]").unwrap_err();
        assert!(matches!(err, TriageError::MalformedResponse(ref m) if m.contains("an array")));
    }

    #[test]
    fn symptom_reply_requires_diagnosis() {
        let err = parse_symptom_reply(r#"{"urgency_level": "High"}"#).unwrap_err();
        assert!(matches!(err, TriageError::MalformedResponse(_)));
    }

    #[test]
    fn image_reply_accepts_mismatch_without_diagnosis() {
        assert!(parse_image_reply(r#"{"image_match": false, "mismatch_reason": "cat, not dog"}"#).is_ok());
        assert!(parse_image_reply(r#"{"recommendation": "x"}"#).is_err());
    }
}
