//! Skip rules: decide which resolved requests are left untouched.
//!
//! Two sources of rules are combined; either one matching skips the element:
//! - glob patterns from [`PassConfig::skip`] matched against the resolved
//!   resource path
//! - an optional programmatic [`SkipPredicate`] over the whole descriptor
//!
//! Rules run after prefix resolution so they see the final resource path.

use std::fmt;
use std::sync::Arc;

use crate::config::PassConfig;
use crate::core::ConfigError;
use crate::resolver::RequestDescriptor;

/// Shareable predicate over a resolved request.
#[derive(Clone)]
pub struct SkipPredicate(Arc<dyn Fn(&RequestDescriptor) -> bool + Send + Sync>);

impl SkipPredicate {
    /// Wrap a closure.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Evaluate the predicate.
    #[must_use]
    pub fn matches(&self, request: &RequestDescriptor) -> bool {
        (self.0)(request)
    }
}

impl fmt::Debug for SkipPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SkipPredicate(..)")
    }
}

/// Compiled skip rules for one transform.
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    patterns: Vec<glob::Pattern>,
    predicate: Option<SkipPredicate>,
}

impl SkipFilter {
    /// Compile the skip rules of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSkipPattern`] for a malformed glob.
    pub fn from_config(config: &PassConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .skip
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidSkipPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            predicate: config.skip_predicate.clone(),
        })
    }

    /// Whether no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.predicate.is_none()
    }

    /// Whether `request` must be left unprocessed.
    #[must_use]
    pub fn should_skip(&self, request: &RequestDescriptor) -> bool {
        if self.patterns.iter().any(|p| p.matches(&request.resource_path)) {
            return true;
        }
        self.predicate.as_ref().is_some_and(|predicate| predicate.matches(request))
    }
}
