use crate::{Error, Result};

pub mod comment_validator;
pub mod play_gate;

/// A trimmed, non-empty request field.
pub fn required(raw: Option<&str>, field: &str) -> Result<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::invalid(format!("missing parameter: {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(required(Some(" 5 "), "comment_id").unwrap(), "5");
        let err = required(Some(""), "comment_id").unwrap_err();
        assert_eq!(err.to_string(), "missing parameter: comment_id");
        assert!(required(None, "song_id").is_err());
    }
}
