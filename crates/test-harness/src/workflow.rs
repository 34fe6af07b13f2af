//! AssemblyBuilder: fluent API for scripting carriage assemblies in tests.
//!
//! Drives the real `SessionState` through a `DescriptorCache`, so scenarios
//! exercise the same fetch, match and commit path as an interactive session.
//! Parts are addressed by short names instead of slotmap ids.

use std::collections::HashMap;

use mount_library::{DescriptorCache, InMemorySource};
use mount_session::{PlacedPart, PointRef, SessionConfig, SessionState};
use mount_solver::SurveyEntry;
use mount_types::{GeometryDescriptor, ModelId, PlacedPartId};
use tracing::debug;

use crate::fixtures;
use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

/// A fluent builder for assembling and verifying carriages in tests.
pub struct AssemblyBuilder {
    pub session: SessionState,
    cache: DescriptorCache<InMemorySource>,
    named_parts: HashMap<String, PlacedPartId>,
    history: Vec<(String, String)>,
    auto_check: bool,
}

impl AssemblyBuilder {
    /// Start on `base` with every fixture attachment registered.
    pub fn carriage() -> Result<Self, HarnessError> {
        let mut builder = Self::new(fixtures::CARRIAGE, fixtures::carriage(), SessionConfig::default())?;
        for (model, descriptor) in fixtures::attachments() {
            builder.register(model, descriptor)?;
        }
        Ok(builder)
    }

    /// Start a session on `base` with an otherwise empty library.
    pub fn new(base_model: &str, base: GeometryDescriptor, config: SessionConfig) -> Result<Self, HarnessError> {
        let source = InMemorySource::new().with(base_model, base)?;
        let mut cache = DescriptorCache::new(source);
        let session = SessionState::from_cache(&mut cache, ModelId::new(base_model), config);
        Ok(Self {
            session,
            cache,
            named_parts: HashMap::new(),
            history: Vec::new(),
            auto_check: false,
        })
    }

    /// Run every oracle after each attach and detach and fail on the first violation.
    pub fn with_auto_check(mut self) -> Self {
        self.auto_check = true;
        self
    }

    /// Make `model` fetchable. Descriptors are validated on the way in.
    pub fn register(&mut self, model: &str, descriptor: GeometryDescriptor) -> Result<&mut Self, HarnessError> {
        self.cache.source_mut().insert(ModelId::new(model), descriptor)?;
        Ok(self)
    }

    pub fn cache(&self) -> &DescriptorCache<InMemorySource> {
        &self.cache
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Mount `model` on the base slot `point` and call the new part `name`.
    pub fn attach(&mut self, name: &str, point: &str, model: &str) -> Result<PlacedPartId, HarnessError> {
        self.place(name, PointRef::base(point), model)
    }

    /// Mount `model` on slot `point` of the placed part `owner`.
    pub fn attach_to(
        &mut self,
        name: &str,
        owner: &str,
        point: &str,
        model: &str,
    ) -> Result<PlacedPartId, HarnessError> {
        let owner_id = self.id(owner)?;
        self.place(name, PointRef::on(owner_id, point), model)
    }

    fn place(&mut self, name: &str, point: PointRef, model: &str) -> Result<PlacedPartId, HarnessError> {
        if self.named_parts.contains_key(name) {
            return Err(HarnessError::DuplicateName { name: name.to_string() });
        }
        let id = self
            .session
            .attach(&mut self.cache, point.clone(), ModelId::new(model))
            .map_err(|source| HarnessError::Placement {
                name: name.to_string(),
                source,
            })?;
        debug!(name, point = %point.name, model, "harness attached part");
        self.named_parts.insert(name.to_string(), id);
        self.history.push(("attach".into(), format!("{name} <- {model} @ {}", point.name)));
        self.run_auto_check()?;
        Ok(id)
    }

    /// Detach `name` and everything mounted on it. Returns the removed names,
    /// `name` first, then descendants in breadth-first order.
    pub fn detach(&mut self, name: &str) -> Result<Vec<String>, HarnessError> {
        let id = self.id(name)?;
        let removed = self.session.detach(id).map_err(|source| HarnessError::Placement {
            name: name.to_string(),
            source,
        })?;
        let names: Vec<String> = removed.iter().filter_map(|gone| self.name_of(*gone)).collect();
        for gone in &names {
            self.named_parts.remove(gone);
        }
        self.history.push(("detach".into(), names.join(", ")));
        self.run_auto_check()?;
        Ok(names)
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn id(&self, name: &str) -> Result<PlacedPartId, HarnessError> {
        self.named_parts
            .get(name)
            .copied()
            .ok_or_else(|| HarnessError::PartNotFound { name: name.to_string() })
    }

    pub fn part(&self, name: &str) -> Result<&PlacedPart, HarnessError> {
        let id = self.id(name)?;
        self.session
            .part(id)
            .ok_or_else(|| HarnessError::PartNotFound { name: name.to_string() })
    }

    pub fn name_of(&self, id: PlacedPartId) -> Option<String> {
        self.named_parts
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.clone())
    }

    /// Names of the part's slots that are still free, or of the base's when
    /// `owner` is `None`.
    pub fn open_points(&self, owner: Option<&str>) -> Result<Vec<String>, HarnessError> {
        let owner = owner.map(|name| self.id(name)).transpose()?;
        Ok(self
            .session
            .visible_points()
            .filter(|p| p.owner == owner)
            .map(|p| p.name.clone())
            .collect())
    }

    /// Every candidate face pairing of `model` against base slot `point`.
    pub fn survey(&mut self, point: &str, model: &str) -> Vec<SurveyEntry> {
        let fetched = self.cache.fetch(&ModelId::new(model));
        self.session.survey_point(&PointRef::base(point), &fetched.descriptor)
    }

    /// Operation log as `(operation, detail)` pairs.
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    // ── Verification ────────────────────────────────────────────────────

    /// Run every oracle over the current assembly.
    pub fn check_all(&self) -> Vec<OracleVerdict> {
        oracle::check_session(&self.session)
    }

    /// Fail with the first oracle violation, if any.
    pub fn assert_consistent(&self) -> Result<(), HarnessError> {
        match self.check_all().into_iter().find(|v| !v.passed) {
            Some(v) => Err(HarnessError::OracleFailure {
                oracle: v.oracle_name,
                detail: v.detail,
            }),
            None => Ok(()),
        }
    }

    /// Fail unless `name` sits at `expected` world translation within `tol`.
    pub fn assert_translation(&self, name: &str, expected: [f64; 3], tol: f64) -> Result<(), HarnessError> {
        let actual = self.part(name)?.transform.translation.to_array();
        if actual.iter().zip(expected).all(|(a, e)| (a - e).abs() <= tol) {
            Ok(())
        } else {
            Err(HarnessError::AssertionFailed {
                detail: format!("[{name}] expected translation {expected:?}, got {actual:?}"),
            })
        }
    }

    fn run_auto_check(&self) -> Result<(), HarnessError> {
        if self.auto_check {
            self.assert_consistent()?;
        }
        Ok(())
    }
}
