//! Routing rule declarations.
//!
//! A [`Rule`] binds a target to a combination of domain condition and
//! optional path prefix. Rules are plain values; nothing is registered
//! until the whole sequence is handed to [`RuleTable::build`].
//!
//! [`RuleTable::build`]: crate::routing::table::RuleTable::build

use std::fmt;

use serde::Serialize;

/// How a rule's domain pattern is compared against the request host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubdomainMode {
    /// Host must equal the domain pattern.
    DomainOnly,
    /// Host must be a strict subdomain of the domain pattern.
    IncludeSubdomains,
    /// Domain is ignored; only the path prefix is checked.
    AnyDomain,
}

/// Precedence layer of a compiled rule. Lower variants are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchClass {
    DomainWithPath,
    Domain,
    SubdomainsWithPath,
    Subdomains,
    PathOnly,
}

impl MatchClass {
    pub(crate) fn of(mode: SubdomainMode, has_prefix: bool) -> Self {
        match (mode, has_prefix) {
            (SubdomainMode::DomainOnly, true) => MatchClass::DomainWithPath,
            (SubdomainMode::DomainOnly, false) => MatchClass::Domain,
            (SubdomainMode::IncludeSubdomains, true) => MatchClass::SubdomainsWithPath,
            (SubdomainMode::IncludeSubdomains, false) => MatchClass::Subdomains,
            (SubdomainMode::AnyDomain, _) => MatchClass::PathOnly,
        }
    }
}

/// One routing declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<T> {
    pub target: T,
    pub domain: Option<String>,
    pub mode: SubdomainMode,
    pub path_prefix: Option<Vec<String>>,
}

impl<T> Rule<T> {
    /// Match requests whose host is exactly `domain`.
    pub fn domain(domain: impl Into<String>, target: T) -> Self {
        Self {
            target,
            domain: Some(domain.into()),
            mode: SubdomainMode::DomainOnly,
            path_prefix: None,
        }
    }

    /// Match requests for any strict subdomain of `domain`.
    ///
    /// `example.com` matches `images.example.com` but neither
    /// `example.com` itself nor `badexample.com`.
    pub fn subdomains(domain: impl Into<String>, target: T) -> Self {
        Self {
            target,
            domain: Some(domain.into()),
            mode: SubdomainMode::IncludeSubdomains,
            path_prefix: None,
        }
    }

    /// Match requests on any host whose path starts with `prefix`.
    pub fn path<I, S>(prefix: I, target: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target,
            domain: None,
            mode: SubdomainMode::AnyDomain,
            path_prefix: Some(prefix.into_iter().map(Into::into).collect()),
        }
    }

    /// Restrict the rule to paths starting with `prefix`.
    pub fn with_path<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_prefix = Some(prefix.into_iter().map(Into::into).collect());
        self
    }

    /// The domain itself and every subdomain of it, in one declaration.
    pub fn proxy_all(domain: impl Into<String>, target: T) -> [Self; 2]
    where
        T: Clone,
    {
        let domain = domain.into();
        [
            Self::domain(domain.clone(), target.clone()),
            Self::subdomains(domain, target),
        ]
    }

    pub fn class(&self) -> MatchClass {
        MatchClass::of(self.mode, self.path_prefix.as_ref().is_some_and(|p| !p.is_empty()))
    }
}

impl<T> fmt::Display for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.mode, &self.domain) {
            (SubdomainMode::DomainOnly, Some(d)) => write!(f, "{}", d)?,
            (SubdomainMode::IncludeSubdomains, Some(d)) => write!(f, "*.{}", d)?,
            (SubdomainMode::AnyDomain, None) => write!(f, "*")?,
            (mode, domain) => write!(f, "{:?}({:?})", mode, domain)?,
        }
        match &self.path_prefix {
            Some(prefix) => write!(f, "/{}", prefix.join("/")),
            None => Ok(()),
        }
    }
}
