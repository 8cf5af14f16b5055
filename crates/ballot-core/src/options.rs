//! Parsing of the free-text option list entered when creating a poll.

use std::collections::HashSet;

use crate::error::{BallotError, Result};

/// Minimum number of options a poll must offer.
pub const MIN_OPTIONS: usize = 2;

/// Split comma-separated text into trimmed, non-empty labels.
///
/// Labels are returned in input order. Duplicates are kept here and rejected
/// by [`validate_options`].
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(String::from)
        .collect()
}

/// Require at least [`MIN_OPTIONS`] labels, all distinct.
///
/// Two identical labels would make a vote ambiguous, so they are refused
/// rather than merged.
pub fn validate_options(labels: &[String]) -> Result<()> {
    if labels.len() < MIN_OPTIONS {
        return Err(BallotError::Validation(format!(
            "at least {MIN_OPTIONS} options are required, got {}",
            labels.len()
        )));
    }

    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(BallotError::Validation(format!(
                "duplicate option label: {label:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_empty_fragments() {
        assert_eq!(
            parse_options("  Red , Blue,, ,Green  ,"),
            vec!["Red", "Blue", "Green"]
        );
    }

    #[test]
    fn keeps_inner_whitespace() {
        assert_eq!(parse_options("New York, Los Angeles"), vec!["New York", "Los Angeles"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_options("").is_empty());
        assert!(parse_options(" , , ").is_empty());
    }

    #[test]
    fn fewer_than_two_is_invalid() {
        let err = validate_options(&parse_options("Only one")).unwrap_err();
        assert!(matches!(err, BallotError::Validation(_)));
    }

    #[test]
    fn duplicates_after_trim_are_invalid() {
        let labels = parse_options("Red, Blue, Red");
        assert_eq!(labels, vec!["Red", "Blue", "Red"]);
        let err = validate_options(&labels).unwrap_err();
        assert!(err.to_string().contains("duplicate option label"));
    }

    #[test]
    fn labels_are_case_sensitive() {
        validate_options(&parse_options("red, Red")).unwrap();
    }
}
