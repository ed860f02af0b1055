//! Reserved tag key filter
//!
//! Cloud providers reserve a key namespace for tags they manage themselves
//! (`aws:` on AWS). Those keys are never created, removed or reported by
//! tagsync.

use regex_lite::Regex;

/// Reserved key patterns used when none are configured
pub const DEFAULT_RESERVED_PATTERNS: &[&str] = &["^aws:"];

/// Error building a tag filter
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid reserved tag pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Matches tag keys against a list of reserved-key regex patterns
#[derive(Debug, Clone)]
pub struct TagFilter {
    patterns: Vec<Regex>,
}

impl TagFilter {
    /// Compile a filter from regex patterns
    pub fn new<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|e| FilterError::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if `key` is reserved and must be left alone
    pub fn is_ignored(&self, key: &str) -> bool {
        match self.patterns.iter().find(|re| re.is_match(key)) {
            Some(re) => {
                tracing::debug!(key, pattern = re.as_str(), "ignoring reserved tag");
                true
            }
            None => false,
        }
    }

    /// Source text of the configured patterns
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Regex::as_str).collect()
    }
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_PATTERNS).expect("default reserved patterns compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ignores_aws_namespace() {
        let filter = TagFilter::default();
        assert!(filter.is_ignored("aws:createdBy"));
        assert!(filter.is_ignored("aws:cloudformation:stack-name"));
        assert!(!filter.is_ignored("Environment"));
    }

    #[test]
    fn test_prefix_is_anchored() {
        let filter = TagFilter::default();
        assert!(!filter.is_ignored("team:aws:owner"));
        assert!(!filter.is_ignored("AWS:createdBy"));
        assert!(!filter.is_ignored("aws"));
    }

    #[test]
    fn test_custom_patterns() {
        let filter = TagFilter::new(["^aws:", "^kubernetes\\.io/"]).unwrap();
        assert!(filter.is_ignored("kubernetes.io/cluster/prod"));
        assert!(filter.is_ignored("aws:createdBy"));
        assert!(!filter.is_ignored("Owner"));
        assert_eq!(filter.patterns(), vec!["^aws:", "^kubernetes\\.io/"]);
    }

    #[test]
    fn test_empty_pattern_list_ignores_nothing() {
        let filter = TagFilter::new(Vec::<String>::new()).unwrap();
        assert!(!filter.is_ignored("aws:createdBy"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = TagFilter::new(["^aws:", "(unclosed"]).unwrap_err();
        let FilterError::InvalidPattern { pattern, .. } = err;
        assert_eq!(pattern, "(unclosed");
    }

    #[test]
    fn test_default_matches_constant() {
        assert_eq!(TagFilter::default().patterns(), DEFAULT_RESERVED_PATTERNS);
    }

    #[test]
    fn test_default_patterns_all_compile() {
        for pattern in DEFAULT_RESERVED_PATTERNS {
            assert!(Regex::new(pattern).is_ok(), "{pattern} does not compile");
        }
        assert_eq!(
            TagFilter::default().patterns().len(),
            DEFAULT_RESERVED_PATTERNS.len()
        );
    }
}
