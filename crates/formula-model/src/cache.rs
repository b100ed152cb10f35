// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Descriptor cache
//!
//! Descriptors are a pure function of their [`TypeIdentity`], so they are
//! created once and shared by every resolver of a resolver tree. The cache is
//! owned by the root resolver and handed to its children.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use log::trace;

use crate::reflection::TypeIdentity;
use crate::types::TypeDescriptorRef;

/// Basic cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit ratio as percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe identity to descriptor map
///
/// Lookups take a shard read lock; first population takes the shard write lock.
/// When two threads race to create the same descriptor, the first insert wins
/// and both callers receive it.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    descriptors: DashMap<TypeIdentity, TypeDescriptorRef>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &TypeIdentity) -> Option<TypeDescriptorRef> {
        self.descriptors.get(identity).map(|entry| entry.value().clone())
    }

    /// Return the cached descriptor, or create and cache it
    ///
    /// `create` runs without any lock held, so it may describe other types
    /// through the same cache.
    pub fn get_or_insert_with(
        &self,
        identity: TypeIdentity,
        create: impl FnOnce() -> TypeDescriptorRef,
    ) -> TypeDescriptorRef {
        if let Some(found) = self.get(&identity) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return found;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("descriptor cache miss for {identity}");

        let created = create();
        self.descriptors
            .entry(identity)
            .or_insert(created)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached descriptor and reset statistics
    pub fn clear(&self) {
        self.descriptors.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ReflectedType;
    use crate::types::PrimitiveType;
    use formula_engine_core::TypeCode;
    use std::sync::Arc;

    #[test]
    fn test_second_lookup_hits() {
        let cache = DescriptorCache::new();
        let identity = ReflectedType::Primitive(TypeCode::Int32).identity();
        let first = cache.get_or_insert_with(identity.clone(), || {
            Arc::new(PrimitiveType::new(TypeCode::Int32, None))
        });
        let second = cache.get_or_insert_with(identity, || unreachable!());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.stats().hit_ratio(), 50.0);
    }

    #[test]
    fn test_concurrent_population_converges() {
        let cache = Arc::new(DescriptorCache::new());
        let identity = ReflectedType::Primitive(TypeCode::Double).identity();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let identity = identity.clone();
                std::thread::spawn(move || {
                    cache.get_or_insert_with(identity, || {
                        Arc::new(PrimitiveType::new(TypeCode::Double, None))
                    })
                })
            })
            .collect();
        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.len(), 1);
        let cached = cache.get(&identity).unwrap();
        assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, &cached)));
    }
}
