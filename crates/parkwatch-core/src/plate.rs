use std::fmt;

use thiserror::Error;

/// Shortest plate accepted after normalization.
pub const MIN_PLATE_CHARS: usize = 6;
/// Longest plate accepted after normalization.
pub const MAX_PLATE_CHARS: usize = 8;

/// A license plate in canonical form.
///
/// Holds only ASCII digits, uppercase ASCII letters, and CJK ideographs,
/// 6 to 8 characters long. Every path that touches a plate string, whether
/// it is a submission, an ownership check, or a list filter, parses through
/// here first so matching compares like with like.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlateToken(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlateError {
    #[error("plate must be 6 to 8 characters after normalization, got {0}")]
    Length(usize),
}

impl PlateToken {
    /// Normalize a raw plate string.
    ///
    /// Drops every character outside the plate alphabet (separators, dots,
    /// whitespace) and uppercases ASCII letters. Normalizing an already
    /// normalized plate returns it unchanged.
    pub fn parse(raw: &str) -> Result<Self, PlateError> {
        let normalized: String = raw
            .chars()
            .filter(|c| is_plate_char(*c))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let len = normalized.chars().count();
        if !(MIN_PLATE_CHARS..=MAX_PLATE_CHARS).contains(&len) {
            return Err(PlateError::Length(len));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plate alphabet: ASCII alphanumerics plus the CJK unified ideographs
/// used as region prefixes.
fn is_plate_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn uppercases_and_strips_separators() {
        let plate = PlateToken::parse("京a·12345").unwrap();
        assert_eq!(plate.as_str(), "京A12345");

        let plate = PlateToken::parse(" jb-678 90 ").unwrap();
        assert_eq!(plate.as_str(), "JB67890");
    }

    #[test]
    fn keeps_cjk_ideographs() {
        let plate = PlateToken::parse("浙B123警").unwrap();
        assert_eq!(plate.as_str(), "浙B123警");
    }

    #[test]
    fn drops_non_ascii_letters() {
        // Accented letters are not in the plate alphabet.
        let plate = PlateToken::parse("ÉJA12345").unwrap();
        assert_eq!(plate.as_str(), "JA12345");
    }

    #[test]
    fn rejects_too_short_and_too_long() {
        assert_eq!(PlateToken::parse("PA111"), Err(PlateError::Length(5)));
        assert_eq!(PlateToken::parse("AB1234567"), Err(PlateError::Length(9)));
        assert_eq!(PlateToken::parse("···"), Err(PlateError::Length(0)));
    }

    #[test]
    fn accepts_both_length_bounds() {
        assert!(PlateToken::parse("AB1234").is_ok());
        assert!(PlateToken::parse("AB123456").is_ok());
    }

    #[test]
    fn separators_do_not_count_toward_length() {
        // Five plate characters stay five no matter how much padding.
        assert_eq!(
            PlateToken::parse("P-A-1-1-1"),
            Err(PlateError::Length(5))
        );
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[a-zA-Z0-9京沪浙粤津 ·\\-]{0,12}") {
            if let Ok(plate) = PlateToken::parse(&raw) {
                prop_assert_eq!(PlateToken::parse(plate.as_str()), Ok(plate.clone()));
            }
        }

        #[test]
        fn normalized_plates_use_only_the_plate_alphabet(raw in "[a-zA-Z0-9京沪浙粤津 ·\\-]{0,12}") {
            if let Ok(plate) = PlateToken::parse(&raw) {
                prop_assert!(plate.as_str().chars().all(is_plate_char));
                prop_assert!(!plate.as_str().chars().any(|c| c.is_ascii_lowercase()));
                let len = plate.as_str().chars().count();
                prop_assert!((MIN_PLATE_CHARS..=MAX_PLATE_CHARS).contains(&len));
            }
        }
    }
}
