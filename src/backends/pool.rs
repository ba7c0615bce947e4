//! Backend set management.
//!
//! # Responsibilities
//! - Build named backends from configuration
//! - Look backends up by the name routes refer to
//! - Later definitions of a name replace earlier ones

use std::collections::HashMap;
use std::sync::Arc;

use crate::backends::backend::{Backend, BackendError};
use crate::config::BackendConfig;

/// All declared backends, addressable by name.
#[derive(Debug, Default)]
pub struct BackendSet {
    backends: HashMap<String, Arc<Backend>>,
}

impl BackendSet {
    /// Create a backend set from configuration.
    pub fn new(configs: &[BackendConfig]) -> Result<Self, BackendError> {
        let mut set = Self::default();
        for config in configs {
            let backend = Arc::new(Backend::from_config(config)?);
            if set.backends.insert(config.name.clone(), backend).is_some() {
                tracing::warn!(backend = %config.name, "Duplicate backend name, keeping the last definition");
            }
        }
        Ok(set)
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Backend>> {
        self.backends.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, address: &str) -> BackendConfig {
        BackendConfig {
            name: name.into(),
            address: address.into(),
            sockets: vec![],
        }
    }

    #[test]
    fn test_lookup() {
        let set = BackendSet::new(&[config("b", "127.0.0.1:2"), config("a", "127.0.0.1:1")]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").unwrap().addr.port(), 1);
        assert!(set.get("missing").is_none());
        assert!(BackendSet::new(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_name_keeps_last() {
        let set = BackendSet::new(&[config("a", "127.0.0.1:1"), config("a", "127.0.0.1:2")]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().addr.port(), 2);
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!(BackendSet::new(&[config("a", "nope")]).is_err());
    }
}
