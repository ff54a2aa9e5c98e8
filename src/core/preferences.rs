use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// `@` followed by one or more word characters
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)").expect("mention pattern is valid"));

/// Handles each user mentions in their description, keyed by user index
///
/// Users without a single mention have no entry at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceMap {
    mentions: HashMap<usize, HashSet<String>>,
}

impl PreferenceMap {
    /// Does user `index` mention `handle`?
    #[inline]
    pub fn wants(&self, index: usize, handle: &str) -> bool {
        self.mentions
            .get(&index)
            .is_some_and(|handles| handles.contains(handle))
    }

    pub fn get(&self, index: usize) -> Option<&HashSet<String>> {
        self.mentions.get(&index)
    }

    /// Number of users with at least one mention
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

/// Scan every text for `@handle` mentions
///
/// Matching is case-sensitive on the raw token; repeated mentions collapse.
pub fn extract_preferences<S: AsRef<str>>(texts: &[S]) -> PreferenceMap {
    let mentions = texts
        .iter()
        .enumerate()
        .filter_map(|(index, text)| {
            let handles: HashSet<String> = MENTION
                .captures_iter(text.as_ref())
                .map(|caps| caps[1].to_string())
                .collect();

            (!handles.is_empty()).then_some((index, handles))
        })
        .collect();

    PreferenceMap { mentions }
}
