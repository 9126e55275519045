use serde::{Deserialize, Serialize};

use crate::error::{CspError, CspResult};

/// Configuration for the policy parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum header length in bytes
    pub max_header_length: usize,
    /// Maximum number of directives, ineffective ones included
    pub max_directives: usize,
    /// Maximum number of sources in a single source-list directive
    pub max_sources_per_directive: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_header_length: 16 * 1024,
            max_directives: 256,
            max_sources_per_directive: 512,
        }
    }
}

impl ParserConfig {
    /// A configuration without effective limits
    pub fn unbounded() -> Self {
        Self {
            max_header_length: usize::MAX,
            max_directives: usize::MAX,
            max_sources_per_directive: usize::MAX,
        }
    }

    pub(crate) fn check_header_length(&self, actual: usize) -> CspResult<()> {
        check("header length", self.max_header_length, actual)
    }

    pub(crate) fn check_directive_count(&self, actual: usize) -> CspResult<()> {
        check("directive count", self.max_directives, actual)
    }

    pub(crate) fn check_source_count(&self, actual: usize) -> CspResult<()> {
        check("source count", self.max_sources_per_directive, actual)
    }
}

fn check(what: &'static str, limit: usize, actual: usize) -> CspResult<()> {
    if actual > limit {
        Err(CspError::LimitExceeded { what, limit, actual })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.max_header_length, 16 * 1024);
        assert_eq!(config.max_directives, 256);
        assert_eq!(config.max_sources_per_directive, 512);
    }

    #[test]
    fn test_limits() {
        let config = ParserConfig {
            max_directives: 2,
            ..Default::default()
        };
        assert!(config.check_directive_count(2).is_ok());
        assert_eq!(
            config.check_directive_count(3),
            Err(CspError::LimitExceeded {
                what: "directive count",
                limit: 2,
                actual: 3
            })
        );
        assert!(ParserConfig::unbounded().check_header_length(usize::MAX).is_ok());
    }
}
