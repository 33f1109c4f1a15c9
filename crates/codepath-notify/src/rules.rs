//! Ownership rules: `<regex>:<email>`, one per line.

use crate::error::{ConfigError, Error, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// One routing rule: files whose path matches `pattern` belong to `recipient`.
#[derive(Debug, Clone)]
pub struct OwnershipRule {
    /// Unanchored pattern tested against the repository-relative path.
    pub pattern: Regex,
    /// Email address notified on a match.
    pub recipient: String,
}

impl OwnershipRule {
    /// True if the pattern matches anywhere in `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Reads and parses the rules file at `path`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or any line is invalid.
pub fn load_rules(path: &Path) -> Result<Vec<OwnershipRule>> {
    let to_error = |source| Error::Config {
        path: path.to_path_buf(),
        source,
    };

    let text = std::fs::read_to_string(path).map_err(|e| to_error(ConfigError::Read(e)))?;
    let rules = parse_rules(&text).map_err(to_error)?;
    debug!(path = %path.display(), rules = rules.len(), "parsed ownership rules");
    Ok(rules)
}

/// Parses rules from text.
///
/// Each non-blank line is split on its first `:`; both halves are trimmed.
/// Everything after that colon is the recipient, so patterns cannot contain
/// a colon but recipients could.
///
/// # Errors
///
/// Returns the first invalid line; there is no partial result.
pub fn parse_rules(text: &str) -> std::result::Result<Vec<OwnershipRule>, ConfigError> {
    let mut rules = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let (pattern, recipient) = raw
            .split_once(':')
            .ok_or(ConfigError::MissingSeparator { line })?;
        let (pattern, recipient) = (pattern.trim(), recipient.trim());

        if pattern.is_empty() {
            return Err(ConfigError::EmptyPart {
                line,
                part: "pattern",
            });
        }
        if recipient.is_empty() {
            return Err(ConfigError::EmptyPart {
                line,
                part: "recipient",
            });
        }

        let pattern =
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { line, source })?;
        rules.push(OwnershipRule {
            pattern,
            recipient: recipient.to_string(),
        });
    }

    Ok(rules)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    #[test]
    fn parses_lines_in_order() {
        let rules = parse_rules(
            "^src/adapters/.*:owner@example.com\n\n  rubicon|magnite  :  header-bidding@magnite.com  \n",
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].recipient, "owner@example.com");
        assert!(rules[0].matches("src/adapters/foo.js"));
        assert!(!rules[0].matches("test/src/adapters/foo.js"));
        assert_eq!(rules[1].pattern.as_str(), "rubicon|magnite");
        assert_eq!(rules[1].recipient, "header-bidding@magnite.com");
    }

    #[test]
    fn patterns_are_unanchored() {
        let rules = parse_rules("adapter:a@x.com").unwrap();
        assert!(rules[0].matches("modules/rubiconBidAdapter.js"));
    }

    #[test]
    fn splits_on_first_colon_only() {
        let rules = parse_rules(r"\.java$:team:java@x.com").unwrap();
        assert_eq!(rules[0].pattern.as_str(), r"\.java$");
        assert_eq!(rules[0].recipient, "team:java@x.com");
    }

    #[test]
    fn crlf_and_whitespace_lines() {
        let rules = parse_rules("a:x@y.com\r\n   \r\n\tb:z@y.com\r\n").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].recipient, "z@y.com");
    }

    #[test]
    fn empty_file_has_no_rules() {
        assert!(parse_rules("").unwrap().is_empty());
        assert!(parse_rules("\n\n").unwrap().is_empty());
    }

    #[test]
    fn invalid_lines_report_line_numbers() {
        assert!(matches!(
            parse_rules("a:x@y.com\nno separator here"),
            Err(ConfigError::MissingSeparator { line: 2 })
        ));
        assert!(matches!(
            parse_rules(" :x@y.com"),
            Err(ConfigError::EmptyPart { line: 1, part: "pattern" })
        ));
        assert!(matches!(
            parse_rules("\n\nsrc/:  "),
            Err(ConfigError::EmptyPart { line: 3, part: "recipient" })
        ));
        assert!(matches!(
            parse_rules("src/(unclosed:x@y.com"),
            Err(ConfigError::InvalidPattern { line: 1, .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "^src/:dev@example.com").unwrap();

        let rules = load_rules(file.path()).unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codepath-notification");

        let err = load_rules(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::Config { ref path, source: ConfigError::Read(_) }
                if path.ends_with("codepath-notification")
        ));
    }

    proptest! {
        #[test]
        fn recipient_is_trimmed_text_after_first_colon(
            pattern in "[a-z/_.]{1,12}",
            recipient in "[a-z:@.]{1,20}",
            left in "[ \t]{0,3}",
            right in "[ \t]{0,3}",
        ) {
            prop_assume!(!recipient.trim().is_empty());
            let line = format!("{left}{pattern}{right}:{left}{recipient}{right}");
            let rules = parse_rules(&line).unwrap();
            prop_assert_eq!(rules.len(), 1);
            prop_assert_eq!(&rules[0].recipient, recipient.trim());
        }

        #[test]
        fn rule_matches_exactly_what_the_regex_matches(
            pattern in "[a-c.*]{1,6}",
            path in "[a-c/]{0,12}",
        ) {
            prop_assume!(Regex::new(&pattern).is_ok());
            let rules = parse_rules(&format!("{pattern}:o@x.com")).unwrap();
            prop_assert_eq!(rules[0].matches(&path), Regex::new(&pattern).unwrap().is_match(&path));
        }
    }
}
