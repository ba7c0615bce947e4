//! Sub-resource collision detection.
//!
//! # Responsibilities
//! - Ask every target for the sub-resource keys it owns
//! - Report every key owned by more than one distinct target
//!
//! # Design Decisions
//! - The whole registry is scanned before failing, so one error lists every
//!   collision and every owner
//! - A target repeating one of its own keys is not a collision
//! - Collisions are reported in the order their keys were first seen

use std::collections::HashMap;
use std::fmt::Display;

use crate::error::{Collision, CollisionError};

/// Capability of a target to list the sub-resources it claims.
pub trait SubResources {
    /// Keys owned by this target, e.g. socket mount paths.
    fn sub_resources(&self) -> Vec<String>;
}

impl<T: SubResources + ?Sized> SubResources for &T {
    fn sub_resources(&self) -> Vec<String> {
        (**self).sub_resources()
    }
}

impl<T: SubResources + ?Sized> SubResources for std::sync::Arc<T> {
    fn sub_resources(&self) -> Vec<String> {
        (**self).sub_resources()
    }
}

/// Check that no sub-resource key is owned by two different targets.
///
/// Targets are told apart by equality, not by name: two unequal targets
/// that display the same way still collide.
pub fn validate<T>(targets: &[T]) -> Result<(), CollisionError>
where
    T: SubResources + PartialEq + Display,
{
    // key -> positions of the distinct targets owning it
    let mut owners: Vec<(String, Vec<usize>)> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (position, target) in targets.iter().enumerate() {
        let owner = targets.iter().position(|t| t == target).unwrap_or(position);
        for key in target.sub_resources() {
            let slot = *by_key.entry(key.clone()).or_insert_with(|| {
                owners.push((key, Vec::new()));
                owners.len() - 1
            });
            let claimed = &mut owners[slot].1;
            if !claimed.contains(&owner) {
                claimed.push(owner);
            }
        }
    }

    let collisions: Vec<Collision> = owners
        .into_iter()
        .filter(|(_, claimed)| claimed.len() > 1)
        .map(|(key, claimed)| Collision {
            key,
            targets: claimed.iter().map(|&i| targets[i].to_string()).collect(),
        })
        .collect();

    if collisions.is_empty() {
        tracing::debug!(targets = targets.len(), "No sub-resource collisions");
        return Ok(());
    }

    for collision in &collisions {
        tracing::error!(
            key = %collision.key,
            targets = ?collision.targets,
            "Sub-resource claimed by multiple backends"
        );
    }
    Err(CollisionError { collisions })
}
