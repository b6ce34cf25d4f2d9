//! The descriptor arena.
//!
//! A [`Catalog`] owns every [`Descriptor`], the [`ModelRegistry`] and the
//! [`HalConfig`]. Descriptors are appended by [`Catalog::declare`] and never
//! change afterwards, so a finished catalog can be shared across threads
//! behind an `Arc` or a plain reference.

use crate::config::HalConfig;
use crate::descriptor::{CollectionSpec, Declarations, Descriptor, DescriptorBuilder, DescriptorId};
use crate::error::{DeclarationError, HalError};
use crate::field::Declared;
use crate::field_set::FieldSet;
use crate::registry::ModelRegistry;
use crate::resource::Resource;
use core::any::TypeId;
use core::fmt;

/// Arena of descriptors plus the model registry.
#[derive(Default)]
pub struct Catalog {
    descriptors: Vec<Descriptor>,
    models: ModelRegistry,
    config: HalConfig,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field(
                "descriptors",
                &self.descriptors.iter().map(Descriptor::name).collect::<Vec<_>>(),
            )
            .field("models", &self.models)
            .field("config", &self.config)
            .finish()
    }
}

impl Catalog {
    /// Creates an empty catalog with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: HalConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    /// Returns the model registry.
    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Returns a descriptor by id.
    #[must_use]
    pub fn get(&self, id: DescriptorId) -> Option<&Descriptor> {
        self.descriptors.get(id.index())
    }

    /// Returns a descriptor by id, or [`HalError::UnknownDescriptor`].
    pub fn descriptor(&self, id: DescriptorId) -> Result<&Descriptor, HalError> {
        self.get(id).ok_or(HalError::UnknownDescriptor(id))
    }

    /// Returns the first descriptor declared under `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.name() == name)
    }

    /// Iterates over the descriptors in declaration order.
    pub fn iter(&self) -> core::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Validates `builder`, merges in its parent and freezes it.
    ///
    /// Own fields override inherited ones by name. Inherited resolvers are
    /// rebound to the new descriptor, so the helpers they call resolve on it.
    /// The collection spec, policy and post-serialize hook are inherited
    /// unless the builder declares its own. A descriptor without its own
    /// models is registered for its parent's.
    ///
    /// # Errors
    ///
    /// Returns a [`DeclarationError`] if the parent or a pinned embed
    /// descriptor is unknown, a field has an empty name, or a link or curie
    /// has neither a value nor a resolver.
    pub fn declare(&mut self, builder: DescriptorBuilder) -> Result<DescriptorId, DeclarationError> {
        self.validate(&builder)?;

        let id = DescriptorId::new(self.descriptors.len());
        let parent = match builder.parent {
            Some(parent_id) => Some(self.get(parent_id).ok_or_else(|| {
                DeclarationError::UnknownParent {
                    descriptor: builder.name.clone(),
                    parent: parent_id,
                }
            })?),
            None => None,
        };

        let DescriptorBuilder {
            name,
            parent: parent_id,
            mut models,
            attributes,
            links,
            curies,
            embeds,
            helpers,
            collection,
            policy,
            post_serialize,
        } = builder;

        let mut merged_helpers = parent.map(|p| p.helpers.clone()).unwrap_or_default();
        merged_helpers.extend(helpers);

        let collection = collection
            .or_else(|| parent.and_then(|p| p.collection.clone()))
            .map(|mut spec| {
                spec.rebind_all(id);
                spec
            });

        if models.is_empty()
            && let Some(parent_id) = parent_id
        {
            models = self.models.models_of(parent_id);
        }

        let descriptor = Descriptor {
            id,
            attributes: merge(parent.map(|p| &p.attributes), attributes, id),
            links: merge(parent.map(|p| &p.links), links, id),
            curies: merge(parent.map(|p| &p.curies), curies, id),
            embeds: merge(parent.map(|p| &p.embeds), embeds, id),
            helpers: merged_helpers,
            collection,
            policy: policy.or_else(|| parent.and_then(|p| p.policy.clone())),
            post_serialize: post_serialize.or_else(|| parent.and_then(|p| p.post_serialize.clone())),
            name,
            parent: parent_id,
        };

        tracing::debug!(
            descriptor = %descriptor.name,
            id = %id,
            parent = ?parent_id,
            attributes = descriptor.attributes.len(),
            links = descriptor.links.len(),
            curies = descriptor.curies.len(),
            embeds = descriptor.embeds.len(),
            "declared descriptor"
        );

        for (model, model_name) in models {
            self.models.register(model, model_name, id);
        }
        self.descriptors.push(descriptor);
        Ok(id)
    }

    /// Registers an existing descriptor for model type `M`.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::UnknownDescriptor`] if `id` is not in this catalog.
    pub fn register_model<M: Resource>(&mut self, id: DescriptorId) -> Result<(), HalError> {
        self.descriptor(id)?;
        self.models
            .register(TypeId::of::<M>(), core::any::type_name::<M>(), id);
        Ok(())
    }

    /// Finds the descriptor for a resource by its model chain.
    #[must_use]
    pub fn lookup(&self, resource: &dyn Resource) -> Option<&Descriptor> {
        self.models
            .lookup(&resource.model_chain())
            .and_then(|id| self.get(id))
    }

    /// Finds every descriptor registered for the nearest type in the
    /// resource's model chain.
    #[must_use]
    pub fn lookup_all(&self, resource: &dyn Resource) -> Vec<&Descriptor> {
        self.models
            .lookup_all(&resource.model_chain())
            .iter()
            .filter_map(|id| self.get(*id))
            .collect()
    }

    fn validate(&self, builder: &DescriptorBuilder) -> Result<(), DeclarationError> {
        let own = Declarations {
            attributes: &builder.attributes,
            links: &builder.links,
            curies: &builder.curies,
            embeds: &builder.embeds,
        };
        self.validate_declarations(&builder.name, own)?;
        if let Some(collection) = &builder.collection {
            self.validate_collection(&builder.name, collection)?;
        }
        Ok(())
    }

    fn validate_collection(
        &self,
        descriptor: &str,
        collection: &CollectionSpec,
    ) -> Result<(), DeclarationError> {
        if collection.name().is_empty() {
            return Err(DeclarationError::EmptyName {
                kind: "collection",
                descriptor: descriptor.to_owned(),
            });
        }
        self.validate_declarations(descriptor, collection.declarations())
    }

    fn validate_declarations(
        &self,
        descriptor: &str,
        declarations: Declarations<'_>,
    ) -> Result<(), DeclarationError> {
        check_names("attribute", descriptor, declarations.attributes)?;
        check_names("link", descriptor, declarations.links)?;
        check_names("curie", descriptor, declarations.curies)?;
        check_names("embed", descriptor, declarations.embeds)?;

        let missing = |kind: &'static str, name: &str| DeclarationError::MissingValue {
            kind,
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        };
        if let Some(link) = declarations.links.iter().find(|link| !link.field().has_value()) {
            return Err(missing("link", link.rel()));
        }
        if let Some(curie) = declarations.curies.iter().find(|curie| !curie.field().has_value()) {
            return Err(missing("curie", curie.name()));
        }

        for embed in declarations.embeds {
            if let Some(target) = embed.descriptor()
                && self.get(target).is_none()
            {
                return Err(DeclarationError::UnknownDescriptor {
                    descriptor: descriptor.to_owned(),
                    embed: embed.name().to_owned(),
                    target,
                });
            }
        }
        Ok(())
    }
}

fn check_names<F: Declared>(
    kind: &'static str,
    descriptor: &str,
    fields: &FieldSet<F>,
) -> Result<(), DeclarationError> {
    if fields.iter().any(|field| field.name().is_empty()) {
        return Err(DeclarationError::EmptyName {
            kind,
            descriptor: descriptor.to_owned(),
        });
    }
    Ok(())
}

fn merge<F: Declared>(
    inherited: Option<&FieldSet<F>>,
    mut own: FieldSet<F>,
    id: DescriptorId,
) -> FieldSet<F> {
    own.rebind_all(id);
    let mut merged =
        inherited.map_or_else(FieldSet::new, |parent| FieldSet::inherited_from(parent, id));
    merged.overlay(own);
    merged
}
