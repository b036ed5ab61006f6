//! Plate-set fields.
//!
//! A parking slot may have several plates registered against it, stored as
//! one comma-delimited field. Membership is decided token by token with
//! exact equality; a plate that merely appears inside another token is not
//! a match.

/// Iterate the plate tokens of a delimited field, trimmed, empties skipped.
pub fn tokens(field: &str) -> impl Iterator<Item = &str> {
    field.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Whole-token membership test.
pub fn contains(field: &str, plate: &str) -> bool {
    tokens(field).any(|t| t == plate)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn splits_and_trims_tokens() {
        let field = " JA12345 , JB67890 ,, ";
        assert_eq!(tokens(field).collect::<Vec<_>>(), vec!["JA12345", "JB67890"]);
    }

    #[test]
    fn single_token_field() {
        assert!(contains("浙A12345", "浙A12345"));
        assert!(!contains("浙A12345", "A12345"));
    }

    #[test]
    fn matches_each_registered_plate() {
        let field = "PA1111,PB2222";
        assert!(contains(field, "PA1111"));
        assert!(contains(field, "PB2222"));
    }

    #[test]
    fn rejects_partial_tokens() {
        let field = "PA1111,PB2222";
        assert!(!contains(field, "PA111"));
        assert!(!contains(field, "A1111"));
        assert!(!contains(field, "B2222"));
        assert!(!contains(field, "PA11112"));
    }

    #[test]
    fn empty_field_matches_nothing() {
        assert!(!contains("", "PA1111"));
        assert!(!contains(" , ,", "PA1111"));
    }
}
