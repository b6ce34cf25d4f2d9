//! Model to descriptor registry.
//!
//! The [`ModelRegistry`] maps a model's [`TypeId`] to the descriptors that
//! render it. Lookups walk a model chain (the model type followed by its
//! [`supertypes`](crate::Resource::supertypes)) and stop at the first type
//! with registrations. Model types are kept in registration order.

use crate::descriptor::DescriptorId;
use core::any::TypeId;
use hashbrown::HashMap;
use indexmap::IndexMap;

/// Registry of descriptors by model type.
#[derive(Default, Clone)]
pub struct ModelRegistry {
    descriptors: IndexMap<TypeId, Vec<DescriptorId>>,
    names: HashMap<TypeId, &'static str>,
}

impl core::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let models: Vec<_> = self
            .descriptors
            .iter()
            .map(|(model, ids)| (self.names.get(model).copied().unwrap_or("?"), ids))
            .collect();
        f.debug_struct("ModelRegistry")
            .field("models", &models)
            .finish()
    }
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` for the model type `model`.
    ///
    /// Registering the same pair twice is a no-op. Descriptors registered
    /// earlier take precedence in [`lookup`](Self::lookup).
    pub fn register(&mut self, model: TypeId, name: &'static str, descriptor: DescriptorId) {
        let ids = self.descriptors.entry(model).or_default();
        if !ids.contains(&descriptor) {
            ids.push(descriptor);
        }
        self.names.entry(model).or_insert(name);
    }

    /// Returns the preferred descriptor for the first type in `chain` that
    /// has one.
    #[must_use]
    pub fn lookup(&self, chain: &[TypeId]) -> Option<DescriptorId> {
        self.lookup_all(chain).first().copied()
    }

    /// Returns every descriptor registered for the first type in `chain`
    /// that has any, in registration order.
    #[must_use]
    pub fn lookup_all(&self, chain: &[TypeId]) -> &[DescriptorId] {
        chain
            .iter()
            .find_map(|model| self.descriptors.get(model).filter(|ids| !ids.is_empty()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the model types `descriptor` is registered for, in the order
    /// they were first registered.
    #[must_use]
    pub fn models_of(&self, descriptor: DescriptorId) -> Vec<(TypeId, &'static str)> {
        self.descriptors
            .iter()
            .filter(|(_, ids)| ids.contains(&descriptor))
            .map(|(model, _)| (*model, self.names.get(model).copied().unwrap_or("?")))
            .collect()
    }

    /// Returns the number of registered model types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no model is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
