//! Session-lifetime descriptor cache.

use std::collections::HashMap;
use std::sync::Arc;

use mount_types::{GeometryDescriptor, ModelId};
use tracing::{debug, warn};

use crate::source::DescriptorSource;

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub descriptor: Arc<GeometryDescriptor>,
    /// `true` when the source failed and the placeholder was substituted.
    pub degraded: bool,
}

/// Caches descriptors per model for the cache's lifetime, with no eviction.
///
/// Failed fetches fall back to [`GeometryDescriptor::placeholder`] and are not
/// cached, so a later fetch of the same model retries the source.
#[derive(Debug)]
pub struct DescriptorCache<S> {
    source: S,
    entries: HashMap<ModelId, Arc<GeometryDescriptor>>,
    placeholder: Arc<GeometryDescriptor>,
}

impl<S: DescriptorSource> DescriptorCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: HashMap::new(),
            placeholder: Arc::new(GeometryDescriptor::placeholder()),
        }
    }

    pub fn fetch(&mut self, model: &ModelId) -> Fetched {
        if let Some(descriptor) = self.entries.get(model) {
            return Fetched {
                descriptor: Arc::clone(descriptor),
                degraded: false,
            };
        }
        match self.source.fetch(model) {
            Ok(descriptor) => {
                debug!(%model, "descriptor cached");
                let descriptor = Arc::new(descriptor);
                self.entries.insert(model.clone(), Arc::clone(&descriptor));
                Fetched {
                    descriptor,
                    degraded: false,
                }
            }
            Err(err) => {
                warn!(%model, %err, "geometry unavailable, using placeholder");
                Fetched {
                    descriptor: Arc::clone(&self.placeholder),
                    degraded: true,
                }
            }
        }
    }

    /// Cached descriptor for `model`, without touching the source.
    pub fn get(&self, model: &ModelId) -> Option<Arc<GeometryDescriptor>> {
        self.entries.get(model).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
