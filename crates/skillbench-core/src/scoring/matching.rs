//! Pattern matching shared by the scorers

/// Default fraction of significant words a fuzzy match needs
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Words this short or shorter are ignored by fuzzy matching
const MIN_SIGNIFICANT_WORD_LEN: usize = 2;

/// Verbatim substring match
pub fn exact_match(response: &str, pattern: &str) -> bool {
    response.contains(pattern)
}

/// Substring match, or for patterns with more than one significant word,
/// at least `threshold` of those words appearing anywhere in the response.
///
/// Significant words are longer than two characters after trimming
/// surrounding punctuation. Case is compared as given.
pub fn fuzzy_match(response: &str, pattern: &str, threshold: f64) -> bool {
    if exact_match(response, pattern) {
        return true;
    }

    let words = significant_words(pattern);
    if words.len() <= 1 {
        return false;
    }

    let found = words.iter().filter(|word| response.contains(*word)).count();
    found as f64 / words.len() as f64 >= threshold
}

fn significant_words(pattern: &str) -> Vec<&str> {
    pattern
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() > MIN_SIGNIFICANT_WORD_LEN)
        .collect()
}

/// Matching mode for one scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    pub case_sensitive: bool,
    /// `None` for exact matching
    pub fuzzy_threshold: Option<f64>,
}

impl Matcher {
    pub fn exact(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            fuzzy_threshold: None,
        }
    }

    pub fn fuzzy(case_sensitive: bool, threshold: f64) -> Self {
        Self {
            case_sensitive,
            fuzzy_threshold: Some(threshold),
        }
    }

    /// Normalize text the way this matcher compares it
    pub fn normalize(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }

    /// Match `pattern` against an already normalized response
    pub fn matches(&self, normalized_response: &str, pattern: &str) -> bool {
        let pattern = self.normalize(pattern);
        match self.fuzzy_threshold {
            Some(threshold) => fuzzy_match(normalized_response, &pattern, threshold),
            None => exact_match(normalized_response, &pattern),
        }
    }

    /// Split `patterns` into (matched, missed), preserving order
    pub fn partition(&self, response: &str, patterns: &[String]) -> (Vec<String>, Vec<String>) {
        let normalized = self.normalize(response);
        patterns
            .iter()
            .cloned()
            .partition(|pattern| self.matches(&normalized, pattern))
    }
}
