//! Route matching logic.
//!
//! # Responsibilities
//! - Match host (exact, or strict subdomain of a pattern)
//! - Match path prefix (component-wise, case-sensitive)
//! - Combine conditions with AND semantics
//! - Walk a compiled [`RuleTable`] and pick the first matching entry
//!
//! # Design Decisions
//! - Hosts arrive already normalized (lowercase, no port); no allocation here
//! - Subdomain patterns are stored as reversed labels and compared back-to-front
//! - Path prefixes are sequences of segments, never raw string prefixes,
//!   so `/v1` does not match `/v10`
//! - No regex to guarantee O(n) matching

use crate::routing::table::{Entry, RuleTable};

/// Trait for matching a normalized request against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches<S: AsRef<str>>(&self, host: &str, path: &[S]) -> bool;
}

/// Matches the request host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMatcher {
    /// Host equals the domain.
    Exact(String),
    /// Host ends with `.` + domain and has at least one label in front.
    /// Labels are kept in reverse order: `example.com` is `["com", "example"]`.
    Subdomains(Vec<String>),
    /// Any host.
    Any,
}

impl HostMatcher {
    pub fn exact(domain: &str) -> Self {
        HostMatcher::Exact(domain.to_string())
    }

    pub fn subdomains(domain: &str) -> Self {
        HostMatcher::Subdomains(domain.rsplit('.').map(str::to_string).collect())
    }
}

impl Matcher for HostMatcher {
    fn matches<S: AsRef<str>>(&self, host: &str, _path: &[S]) -> bool {
        match self {
            HostMatcher::Exact(domain) => host == domain,
            HostMatcher::Subdomains(reversed) => {
                let mut labels = host.rsplit('.');
                for expected in reversed {
                    match labels.next() {
                        Some(label) if label == expected => {}
                        _ => return false,
                    }
                }
                // A proper subdomain needs a non-empty label left over.
                labels.next().is_some_and(|label| !label.is_empty())
            }
            HostMatcher::Any => true,
        }
    }
}

/// Matches a leading sequence of path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    segments: Vec<String>,
}

impl PathPrefixMatcher {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches<S: AsRef<str>>(&self, _host: &str, path: &[S]) -> bool {
        path.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(expected, actual)| expected == actual.as_ref())
    }
}

impl<T: Send + Sync + std::fmt::Debug> Matcher for Entry<T> {
    fn matches<S: AsRef<str>>(&self, host: &str, path: &[S]) -> bool {
        self.host.matches(host, path)
            && self.path.as_ref().map_or(true, |prefix| prefix.matches(host, path))
    }
}

/// Resolve a normalized host and path to the owning target.
///
/// Entries are tried in table order; the first match wins. Without a match
/// the default target is returned, and `None` only when the table has no
/// default.
pub fn resolve<'t, T, S>(table: &'t RuleTable<T>, host: &str, path: &[S]) -> Option<&'t T>
where
    T: Send + Sync + std::fmt::Debug,
    S: AsRef<str>,
{
    table
        .entries()
        .iter()
        .find(|entry| entry.matches(host, path))
        .map(|entry| &entry.rule.target)
        .or(table.default_target())
}
