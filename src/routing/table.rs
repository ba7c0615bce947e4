//! Rule table compilation.
//!
//! # Responsibilities
//! - Validate each declared rule
//! - Order rules by specificity, independent of declaration order
//! - Hold the optional default target
//! - Expose the deduplicated target registry
//!
//! # Ordering
//! Entries are sorted by, in order:
//! 1. match class (exact domain + path, exact domain, subdomains + path,
//!    subdomains, path only)
//! 2. domain length, longest first
//! 3. domain bytes
//! 4. path prefix length, longest first
//! 5. declaration index
//!
//! Rules with an identical domain, mode and prefix would be left to the
//! declaration index, so they must agree on the target: repeats are dropped,
//! conflicting targets are a configuration error.

use std::cmp::Reverse;

use crate::error::{RouterError, RouterResult};
use crate::routing::matcher::{self, HostMatcher, PathPrefixMatcher};
use crate::routing::rule::{MatchClass, Rule, SubdomainMode};

/// A validated rule with its precompiled matchers.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub rule: Rule<T>,
    pub class: MatchClass,
    /// Position in the declared sequence.
    pub index: usize,
    pub(crate) host: HostMatcher,
    pub(crate) path: Option<PathPrefixMatcher>,
}

impl<T> Entry<T> {
    fn compile(index: usize, mut rule: Rule<T>) -> RouterResult<Self> {
        let invalid = |rule: &Rule<T>, reason: &str| RouterError::Configuration {
            index,
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        if rule.path_prefix.as_ref().is_some_and(Vec::is_empty) {
            rule.path_prefix = None;
        }

        let host = match (rule.mode, rule.domain.as_deref()) {
            (SubdomainMode::AnyDomain, Some(_)) => {
                return Err(invalid(&rule, "an any-domain rule cannot name a domain"));
            }
            (SubdomainMode::AnyDomain, None) => HostMatcher::Any,
            (_, None) => {
                return Err(invalid(&rule, "a domain pattern is required"));
            }
            (mode, Some(domain)) => {
                if let Some(reason) = check_domain(domain) {
                    return Err(invalid(&rule, reason));
                }
                if mode == SubdomainMode::DomainOnly {
                    HostMatcher::exact(domain)
                } else {
                    HostMatcher::subdomains(domain)
                }
            }
        };

        let path = match &rule.path_prefix {
            Some(segments) => {
                if segments.iter().any(|s| s.is_empty() || s.contains('/')) {
                    return Err(invalid(&rule, "path segments must be non-empty and cannot contain `/`"));
                }
                Some(PathPrefixMatcher::new(segments.clone()))
            }
            None if rule.mode == SubdomainMode::AnyDomain => {
                return Err(invalid(&rule, "a path-only rule needs a path prefix; use the default target instead"));
            }
            None => None,
        };

        Ok(Self {
            class: rule.class(),
            index,
            host,
            path,
            rule,
        })
    }

    fn domain_len(&self) -> usize {
        self.rule.domain.as_deref().map_or(0, str::len)
    }

    fn prefix_len(&self) -> usize {
        self.path.as_ref().map_or(0, |p| p.segments().len())
    }

    fn same_condition(&self, other: &Self) -> bool {
        self.class == other.class
            && self.rule.domain == other.rule.domain
            && self.rule.path_prefix == other.rule.path_prefix
    }
}

fn check_domain(domain: &str) -> Option<&'static str> {
    if domain.is_empty() {
        return Some("the domain pattern is empty");
    }
    if domain.split('.').any(str::is_empty) {
        return Some("the domain pattern has an empty label");
    }
    if domain.chars().any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '*')) {
        return Some("the domain pattern contains `/`, `:`, `*` or whitespace");
    }
    // hosts are lowercased before matching
    if domain.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("the domain pattern must be lowercase");
    }
    None
}

/// The compiled, immutable routing table.
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    entries: Vec<Entry<T>>,
    default: Option<T>,
}

impl<T> RuleTable<T> {
    pub fn builder() -> RuleTableBuilder<T> {
        RuleTableBuilder::new()
    }

    /// Compile `rules` with an optional fallback target.
    pub fn build<I>(rules: I, default: Option<T>) -> RouterResult<Self>
    where
        I: IntoIterator<Item = Rule<T>>,
        T: PartialEq,
    {
        let mut builder = Self::builder().rules(rules);
        builder.default = default;
        builder.build()
    }

    /// Entries in evaluation order.
    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn default_target(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// See [`matcher::resolve`].
    pub fn resolve<S: AsRef<str>>(&self, host: &str, path: &[S]) -> Option<&T>
    where
        T: Send + Sync + std::fmt::Debug,
    {
        matcher::resolve(self, host, path)
    }

    /// Every distinct target in declaration order, followed by the default
    /// if it was not already referenced by a rule.
    pub fn targets(&self) -> Vec<&T>
    where
        T: PartialEq,
    {
        let mut declared: Vec<&Entry<T>> = self.entries.iter().collect();
        declared.sort_by_key(|e| e.index);

        let mut targets: Vec<&T> = Vec::new();
        for target in declared.into_iter().map(|e| &e.rule.target).chain(self.default.as_ref()) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

/// Collects rules and table options before compiling.
#[derive(Debug)]
pub struct RuleTableBuilder<T> {
    rules: Vec<Rule<T>>,
    default: Option<T>,
    require_default: bool,
}

impl<T> Default for RuleTableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RuleTableBuilder<T> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default: None,
            require_default: false,
        }
    }

    pub fn rule(mut self, rule: Rule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = Rule<T>>,
    {
        self.rules.extend(rules);
        self
    }

    pub fn default_target(mut self, target: T) -> Self {
        self.default = Some(target);
        self
    }

    /// Fail with [`RouterError::NoDefault`] when no default target is set.
    pub fn require_default(mut self, require: bool) -> Self {
        self.require_default = require;
        self
    }

    pub fn build(self) -> RouterResult<RuleTable<T>>
    where
        T: PartialEq,
    {
        if self.require_default && self.default.is_none() {
            return Err(RouterError::NoDefault);
        }

        let mut sorted = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| Entry::compile(index, rule))
            .collect::<RouterResult<Vec<_>>>()?;

        sorted.sort_by(|a, b| {
            a.class
                .cmp(&b.class)
                .then_with(|| Reverse(a.domain_len()).cmp(&Reverse(b.domain_len())))
                .then_with(|| a.rule.domain.cmp(&b.rule.domain))
                .then_with(|| Reverse(a.prefix_len()).cmp(&Reverse(b.prefix_len())))
                .then_with(|| a.rule.path_prefix.cmp(&b.rule.path_prefix))
                .then_with(|| a.index.cmp(&b.index))
        });

        // Same-condition rules are adjacent after sorting.
        let mut entries: Vec<Entry<T>> = Vec::with_capacity(sorted.len());
        for entry in sorted {
            if let Some(kept) = entries.last().filter(|kept| kept.same_condition(&entry)) {
                if kept.rule.target != entry.rule.target {
                    return Err(RouterError::Configuration {
                        index: entry.index,
                        rule: entry.rule.to_string(),
                        reason: format!("rule {} has the same condition and a different target", kept.index),
                    });
                }
                tracing::debug!(rule = %entry.rule, index = entry.index, "Dropping repeated rule");
                continue;
            }
            entries.push(entry);
        }

        tracing::debug!(
            rules = entries.len(),
            has_default = self.default.is_some(),
            "Rule table compiled"
        );

        Ok(RuleTable {
            entries,
            default: self.default,
        })
    }
}
