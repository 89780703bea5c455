//! Glob patterns for matching payee names.

use regex::{Regex, RegexBuilder};

/// A compiled match rule pattern.
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character. Matching ignores case and must cover the whole name.
#[derive(Debug, Clone)]
pub struct MatchPattern(Regex);

impl MatchPattern {
    /// Compile `glob`.
    ///
    /// Returns `None` if the pattern cannot be compiled, e.g. because it is
    /// too large for the regex engine.
    pub fn new(glob: &str) -> Option<Self> {
        let mut expression = String::with_capacity(glob.len() + 8);
        expression.push('^');

        for character in glob.chars() {
            match character {
                '*' => expression.push_str(".*"),
                '?' => expression.push('.'),
                other => expression.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }

        expression.push('$');

        RegexBuilder::new(&expression)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map(Self)
            .inspect_err(|error| tracing::warn!("could not compile match pattern {glob:?}: {error}"))
            .ok()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}
