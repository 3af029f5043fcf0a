/// Trimmed value of a required text field; blank counts as missing.
pub fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Optional text fields store blanks as NULL.
pub fn optional_text(value: Option<String>) -> Option<String> {
    required_text(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text(Some("  Ana ".into())), Some("Ana".to_string()));
        assert_eq!(required_text(Some("   ".into())), None);
        assert_eq!(required_text(None), None);
    }
}
