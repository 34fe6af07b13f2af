//! Where geometry descriptors come from.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use mount_types::{GeometryDescriptor, ModelId};
use tracing::debug;

use crate::errors::DescriptorError;
use crate::load::{load_descriptor, validate_descriptor};

/// A provider of geometry descriptors keyed by model identity.
pub trait DescriptorSource {
    fn fetch(&self, model: &ModelId) -> Result<GeometryDescriptor, DescriptorError>;
}

/// Reads `<root>/<model>.json`, e.g. `parts/hotend/Dragon.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, model: &ModelId) -> PathBuf {
        self.root.join(format!("{}.json", model.as_str()))
    }
}

impl DescriptorSource for DirectorySource {
    fn fetch(&self, model: &ModelId) -> Result<GeometryDescriptor, DescriptorError> {
        let path = self.path_for(model);
        debug!(path = %path.display(), "reading descriptor");
        let json = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DescriptorError::NotFound(model.clone()),
            _ => DescriptorError::Io {
                model: model.clone(),
                message: e.to_string(),
            },
        })?;
        load_descriptor(&json).map_err(|source| DescriptorError::Invalid {
            model: model.clone(),
            source,
        })
    }
}

/// Descriptors held in memory; used for fixtures and embedded catalogs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    descriptors: HashMap<ModelId, GeometryDescriptor>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `descriptor` under `model`, replacing any previous entry.
    pub fn insert(&mut self, model: ModelId, descriptor: GeometryDescriptor) -> Result<(), DescriptorError> {
        let descriptor = validate_descriptor(descriptor).map_err(|source| DescriptorError::Invalid {
            model: model.clone(),
            source,
        })?;
        self.descriptors.insert(model, descriptor);
        Ok(())
    }

    pub fn with(mut self, model: impl Into<String>, descriptor: GeometryDescriptor) -> Result<Self, DescriptorError> {
        self.insert(ModelId::new(model), descriptor)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl DescriptorSource for InMemorySource {
    fn fetch(&self, model: &ModelId) -> Result<GeometryDescriptor, DescriptorError> {
        self.descriptors
            .get(model)
            .cloned()
            .ok_or_else(|| DescriptorError::NotFound(model.clone()))
    }
}
