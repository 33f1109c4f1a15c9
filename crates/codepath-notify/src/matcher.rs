//! Routing changed files to the owners named by the rules.

use crate::rules::OwnershipRule;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Files to report, grouped by recipient.
///
/// Recipients iterate in sorted order. Within a recipient, files keep the
/// order they were matched in. A file matched by two rules naming the same
/// recipient is listed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet(BTreeMap<String, Vec<String>>);

impl MatchSet {
    /// True when no file matched any rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Files collected for `recipient`.
    #[must_use]
    pub fn get(&self, recipient: &str) -> Option<&[String]> {
        self.0.get(recipient).map(Vec::as_slice)
    }

    /// Iterates `(recipient, files)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn push(&mut self, recipient: &str, file: &str) {
        self.0
            .entry(recipient.to_string())
            .or_default()
            .push(file.to_string());
    }
}

impl IntoIterator for MatchSet {
    type Item = (String, Vec<String>);
    type IntoIter = btree_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Tests every file against every rule.
///
/// Every matching rule counts, so one file can reach several recipients.
/// Recipients with no matching file are absent from the result.
#[must_use]
pub fn match_files<S: AsRef<str>>(files: &[S], rules: &[OwnershipRule]) -> MatchSet {
    let mut set = MatchSet::default();
    for file in files {
        let file = file.as_ref();
        for rule in rules.iter().filter(|rule| rule.matches(file)) {
            set.push(&rule.recipient, file);
        }
    }
    set
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rules::parse_rules;
    use proptest::prelude::*;

    fn rules(text: &str) -> Vec<OwnershipRule> {
        parse_rules(text).unwrap()
    }

    #[test]
    fn groups_by_recipient() {
        let set = match_files(
            &["src/adapters/foo.js", "src/core.js", "src/adapters/bar.js"],
            &rules("^src/adapters/.*:owner@example.com"),
        );

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("owner@example.com").unwrap(),
            ["src/adapters/foo.js", "src/adapters/bar.js"]
        );
    }

    #[test]
    fn one_file_reaches_several_owners() {
        let set = match_files(&["modules/a.js"], &rules("^modules/:a@x.com\n\\.js$:b@x.com"));
        assert_eq!(set.get("a@x.com").unwrap(), ["modules/a.js"]);
        assert_eq!(set.get("b@x.com").unwrap(), ["modules/a.js"]);
    }

    #[test]
    fn same_owner_two_rules_keeps_duplicates() {
        let set = match_files(&["modules/a.js"], &rules("^modules/:a@x.com\n\\.js$:a@x.com"));
        assert_eq!(set.get("a@x.com").unwrap(), ["modules/a.js", "modules/a.js"]);
    }

    #[test]
    fn no_matches_or_no_input_is_empty() {
        assert!(match_files(&["README.md"], &rules("^src/:a@x.com")).is_empty());
        assert!(match_files::<&str>(&[], &rules("^src/:a@x.com")).is_empty());
        assert!(match_files(&["src/x"], &[]).is_empty());
    }

    #[test]
    fn recipients_iterate_sorted() {
        let set = match_files(&["f"], &rules("f:zed@x.com\nf:amy@x.com\nf:kim@x.com"));
        let order: Vec<_> = set.iter().map(|(r, _)| r).collect();
        assert_eq!(order, ["amy@x.com", "kim@x.com", "zed@x.com"]);
    }

    proptest! {
        #[test]
        fn every_listed_file_matches_a_rule_for_that_recipient(
            files in proptest::collection::vec("[ab/]{0,6}", 0..12),
        ) {
            let rules = rules("^a:one@x.com\nb$:two@x.com\n/:one@x.com");
            let set = match_files(&files, &rules);

            for (recipient, listed) in set.iter() {
                prop_assert!(!listed.is_empty());
                for file in listed {
                    prop_assert!(files.contains(file));
                    prop_assert!(rules.iter().any(|r| r.recipient == recipient && r.matches(file)));
                }
            }

            let total: usize = set.iter().map(|(_, f)| f.len()).sum();
            let expected: usize = files
                .iter()
                .map(|f| rules.iter().filter(|r| r.matches(f)).count())
                .sum();
            prop_assert_eq!(total, expected);
        }
    }
}
