use crate::{Error, Result};

pub struct CommentValidator;

impl CommentValidator {
    /// Trims the content and checks `1..=max_len` characters.
    pub fn validate_content(raw: Option<&str>, max_len: usize) -> Result<String> {
        let content = raw
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::invalid("missing parameter: content"))?;

        if content.chars().count() > max_len {
            return Err(Error::invalid(format!(
                "comment content must be at most {max_len} characters"
            )));
        }

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content() {
        assert_eq!(
            CommentValidator::validate_content(Some("  great "), 300).unwrap(),
            "great"
        );
        assert!(CommentValidator::validate_content(None, 300).is_err());
        assert!(CommentValidator::validate_content(Some("   "), 300).is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        let exact = "好".repeat(5);
        assert!(CommentValidator::validate_content(Some(&exact), 5).is_ok());
        assert!(matches!(
            CommentValidator::validate_content(Some("123456"), 5),
            Err(Error::InvalidInput { .. })
        ));
    }
}
