//! Inbound prompt validation.

use serde_json::Value;

use crate::error::RelayError;

/// Longest accepted prompt, in characters, after trimming.
pub const MAX_PROMPT_CHARS: usize = 500;

/// Pull a valid prompt out of a raw request body.
///
/// The body is parsed leniently: any content type is accepted as long as the
/// bytes are JSON. A `prompt` that is absent, `null`, `false`, `0` or `""` is
/// reported as missing; any other non-string as invalid. The prompt is
/// returned exactly as sent, untrimmed.
pub fn extract_prompt(body: &[u8]) -> Result<String, RelayError> {
    let value: Option<Value> = serde_json::from_slice(body).ok();
    let prompt = value
        .as_ref()
        .and_then(|v| v.get("prompt"))
        .filter(|p| !is_blank(p))
        .ok_or(RelayError::MissingPrompt)?;

    let Value::String(prompt) = prompt else {
        return Err(RelayError::InvalidPrompt);
    };

    validate_prompt(prompt)?;
    Ok(prompt.clone())
}

/// Check a prompt string against the length rules.
pub fn validate_prompt(prompt: &str) -> Result<(), RelayError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(RelayError::InvalidPrompt);
    }
    if trimmed.chars().count() > MAX_PROMPT_CHARS {
        return Err(RelayError::PromptTooLong);
    }
    Ok(())
}

/// Values treated as "no prompt given".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(body: &str) -> Result<String, RelayError> {
        extract_prompt(body.as_bytes())
    }

    #[test]
    fn accepts_a_plain_prompt() {
        assert_eq!(
            check(r#"{"prompt":"Weather in Paris?"}"#).unwrap(),
            "Weather in Paris?"
        );
    }

    #[test]
    fn keeps_surrounding_whitespace() {
        assert_eq!(check(r#"{"prompt":"  hi  "}"#).unwrap(), "  hi  ");
    }

    #[test]
    fn missing_or_unparsable_body() {
        for body in ["", "not json", "{", "[]", "{}", r#"{"text":"hi"}"#] {
            assert_eq!(check(body), Err(RelayError::MissingPrompt), "body: {body:?}");
        }
    }

    #[test]
    fn falsy_prompts_are_missing() {
        for body in [
            r#"{"prompt":null}"#,
            r#"{"prompt":""}"#,
            r#"{"prompt":false}"#,
            r#"{"prompt":0}"#,
        ] {
            assert_eq!(check(body), Err(RelayError::MissingPrompt), "body: {body}");
        }
    }

    #[test]
    fn non_string_prompts_are_invalid() {
        for body in [
            r#"{"prompt":42}"#,
            r#"{"prompt":true}"#,
            r#"{"prompt":["a"]}"#,
            r#"{"prompt":{"text":"a"}}"#,
        ] {
            assert_eq!(check(body), Err(RelayError::InvalidPrompt), "body: {body}");
        }
    }

    #[test]
    fn whitespace_only_is_invalid() {
        assert_eq!(check(r#"{"prompt":"   \n\t"}"#), Err(RelayError::InvalidPrompt));
    }

    #[test]
    fn length_boundary() {
        let at_limit = "a".repeat(MAX_PROMPT_CHARS);
        assert!(validate_prompt(&at_limit).is_ok());

        let over = "a".repeat(MAX_PROMPT_CHARS + 1);
        assert_eq!(validate_prompt(&over), Err(RelayError::PromptTooLong));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let accented = "é".repeat(MAX_PROMPT_CHARS);
        assert!(accented.len() > MAX_PROMPT_CHARS);
        assert!(validate_prompt(&accented).is_ok());
    }

    #[test]
    fn length_is_measured_after_trimming() {
        let padded = format!("   {}   ", "a".repeat(MAX_PROMPT_CHARS));
        assert!(validate_prompt(&padded).is_ok());
    }
}
