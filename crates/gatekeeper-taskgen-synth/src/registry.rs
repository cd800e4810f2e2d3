// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl IdentityKey {
    fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Collision-free name allocation for one task bundle.
///
/// The first allocation of a key returns the base name; later ones return
/// `base-2`, `base-3`, ... Probing resumes at the next untried suffix for the
/// key, so repeated allocations stay linear overall.
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<IdentityKey>,
    next_suffix: HashMap<IdentityKey, u32>,
}

impl NameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the allocated name and whether it differs from `base`.
    pub fn allocate(
        &mut self,
        kind: &str,
        namespace: &str,
        base: &str,
    ) -> Result<(String, bool), RegistryError> {
        if base.is_empty() {
            return Err(RegistryError::EmptyBase {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
            });
        }

        let base_key = IdentityKey::new(kind, namespace, base);
        if self.used.insert(base_key.clone()) {
            return Ok((base.to_string(), false));
        }

        let start = self.next_suffix.get(&base_key).copied().unwrap_or(2);
        for suffix in start..=u32::MAX {
            let candidate = format!("{base}-{suffix}");
            if self
                .used
                .insert(IdentityKey::new(kind, namespace, &candidate))
            {
                self.next_suffix
                    .insert(base_key, suffix.saturating_add(1));
                return Ok((candidate, true));
            }
        }

        Err(RegistryError::Exhausted {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            base: base.to_string(),
        })
    }

    #[must_use]
    pub fn is_allocated(&self, kind: &str, namespace: &str, name: &str) -> bool {
        self.used.contains(&IdentityKey::new(kind, namespace, name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
