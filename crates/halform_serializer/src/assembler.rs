//! Recursive document assembly.
//!
//! The [`Assembler`] turns a descriptor and a resource into an ordered tree:
//! attributes first, then `_links` (with a local `curies` list), then
//! `_embedded`. Every field is gated twice, by its embed depth and by the
//! descriptor's policy, before its value is computed.
//!
//! Curies stay where they were declared; hoisting them to the root is
//! [`consolidate`](crate::curies::consolidate)'s job.

use crate::pagination;
use halform_core::{
    Catalog, Declarations, Declared, Descriptor, DescriptorId, Embedded, HalError, Policy,
    Resource, ResourceCollection, RuleKind, Scope, SerializeOptions, Subject,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// An assembled, not yet consolidated, document.
pub type Tree = Map<String, Value>;

/// Builds HAL trees from the descriptors of one catalog.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'c> {
    catalog: &'c Catalog,
}

impl<'c> Assembler<'c> {
    /// Creates an assembler over `catalog`.
    #[must_use]
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Assembles `resource` with descriptor `id`.
    ///
    /// Runs the descriptor's post-serialize hook on the finished tree.
    ///
    /// # Errors
    ///
    /// Fails if a field cannot be computed, an embedded resource has no
    /// descriptor, the hook fails, or embeds nest past the configured depth.
    pub fn to_hash(
        &self,
        id: DescriptorId,
        resource: &dyn Resource,
        options: &SerializeOptions,
    ) -> Result<Tree, HalError> {
        self.check_depth(options)?;
        let descriptor = self.catalog.descriptor(id)?;
        tracing::trace!(
            descriptor = descriptor.name(),
            resource = %resource.identity(),
            depth = options.depth(),
            "assembling resource"
        );

        let subject = Subject::Resource(resource);
        let mut tree = self.render(descriptor, descriptor.declarations(), subject, options)?;

        if let Some(hook) = descriptor.post_serialize() {
            let scope = Scope::new(self.catalog, id, subject, options);
            hook(&scope, &mut tree).map_err(|source| HalError::Hook {
                descriptor: descriptor.name().to_owned(),
                source,
            })?;
        }
        Ok(tree)
    }

    /// Assembles `collection` with the collection spec of descriptor `id`.
    ///
    /// Collection-level fields resolve against the collection. Each member is
    /// assembled with `id` one level deeper and the results are embedded
    /// under the spec's name, after any collection-level embeds.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::MissingCollectionInfo`] if the descriptor has no
    /// collection spec, and otherwise fails like [`to_hash`](Self::to_hash).
    pub fn to_collection_hash(
        &self,
        id: DescriptorId,
        collection: &dyn ResourceCollection,
        options: &SerializeOptions,
        paginate: bool,
    ) -> Result<Tree, HalError> {
        self.check_depth(options)?;
        let descriptor = self.catalog.descriptor(id)?;
        let spec = descriptor
            .collection()
            .ok_or_else(|| HalError::MissingCollectionInfo {
                descriptor: descriptor.name().to_owned(),
            })?;

        let subject = Subject::Collection(collection);
        let mut tree = self.render(descriptor, spec.declarations(), subject, options)?;

        let paginated = paginate
            && collection
                .pageable()
                .is_some_and(|pager| pagination::paginate(&mut tree, pager));

        let members = collection.members();
        tracing::debug!(
            descriptor = descriptor.name(),
            collection = %collection.identity(),
            members = members.len(),
            paginated,
            "assembling collection"
        );

        let nested = options.nested();
        let rendered = members
            .iter()
            .map(|member| self.to_hash(id, member.as_ref(), &nested).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()?;

        let embedded = tree
            .entry("_embedded")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(embedded) = embedded {
            embedded.insert(spec.name().to_owned(), Value::Array(rendered));
        }
        Ok(tree)
    }

    fn render(
        &self,
        descriptor: &Descriptor,
        declarations: Declarations<'_>,
        subject: Subject<'_>,
        options: &SerializeOptions,
    ) -> Result<Tree, HalError> {
        let scope = Scope::new(self.catalog, descriptor.id(), subject, options);
        let gate = Gate {
            policy: descriptor
                .policy()
                .map(|rules| Policy::new(rules, subject, options)),
            depth: options.depth(),
        };

        let mut tree = Map::new();
        for attribute in declarations.attributes {
            if gate.admits(attribute, RuleKind::Attribute) {
                tree.insert(attribute.name().to_owned(), attribute.value(&scope)?);
            }
        }

        let links = self.render_links(declarations, &scope, &gate)?;
        if !links.is_empty() {
            tree.insert("_links".to_owned(), Value::Object(links));
        }

        let embedded = self.render_embeds(declarations, &scope, &gate)?;
        if !embedded.is_empty() {
            tree.insert("_embedded".to_owned(), Value::Object(embedded));
        }
        Ok(tree)
    }

    fn render_links(
        &self,
        declarations: Declarations<'_>,
        scope: &Scope<'_>,
        gate: &Gate<'_>,
    ) -> Result<Tree, HalError> {
        let config = self.catalog.config();
        let mut links = Map::new();

        for link in declarations.links {
            if !gate.admits(link, RuleKind::Link) {
                continue;
            }
            let Some(mut target) = link.resolve(scope)? else {
                continue;
            };
            target.href = config.expand_href(&target.href);
            let rendered = serde_json::to_value(&target)?;

            match links.get_mut(link.rel()) {
                Some(Value::Array(existing)) => existing.push(rendered),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, rendered]);
                }
                None => {
                    links.insert(link.rel().to_owned(), rendered);
                }
            }
        }

        let mut curies = Vec::new();
        for curie in declarations.curies {
            if !curie.visible_at(gate.depth) {
                continue;
            }
            if let Some(mut entry) = curie.resolve(scope)? {
                entry.href = config.expand_href(&entry.href);
                curies.push(serde_json::to_value(entry)?);
            }
        }
        if !curies.is_empty() {
            links.insert("curies".to_owned(), Value::Array(curies));
        }
        Ok(links)
    }

    fn render_embeds(
        &self,
        declarations: Declarations<'_>,
        scope: &Scope<'_>,
        gate: &Gate<'_>,
    ) -> Result<Tree, HalError> {
        let mut embedded = Map::new();

        for embed in declarations.embeds {
            if !gate.admits(embed, RuleKind::Embed) {
                continue;
            }
            let nested = scope.options().nested();
            let rendered = match embed.value(scope)? {
                Embedded::None => continue,
                Embedded::One(resource) => {
                    let id = self.descriptor_for(embed.descriptor(), resource.as_ref())?;
                    Value::Object(self.to_hash(id, resource.as_ref(), &nested)?)
                }
                Embedded::Many(resources) => {
                    Value::Array(self.render_many(embed.descriptor(), &resources, &nested)?)
                }
            };
            embedded.insert(embed.name().to_owned(), rendered);
        }
        Ok(embedded)
    }

    fn render_many(
        &self,
        pinned: Option<DescriptorId>,
        resources: &[Arc<dyn Resource>],
        options: &SerializeOptions,
    ) -> Result<Vec<Value>, HalError> {
        let Some(first) = resources.first() else {
            return Ok(Vec::new());
        };
        let id = self.descriptor_for(pinned, first.as_ref())?;
        resources
            .iter()
            .map(|resource| self.to_hash(id, resource.as_ref(), options).map(Value::Object))
            .collect()
    }

    /// Returns the pinned descriptor, or the one registered for the resource's model.
    fn descriptor_for(
        &self,
        pinned: Option<DescriptorId>,
        resource: &dyn Resource,
    ) -> Result<DescriptorId, HalError> {
        match pinned {
            Some(id) => Ok(id),
            None => self
                .catalog
                .lookup(resource)
                .map(Descriptor::id)
                .ok_or_else(|| HalError::missing_descriptor(resource.identity())),
        }
    }

    fn check_depth(&self, options: &SerializeOptions) -> Result<(), HalError> {
        let limit = self.catalog.config().max_depth();
        if options.depth() > limit {
            return Err(HalError::DepthLimitExceeded { limit });
        }
        Ok(())
    }
}

/// Depth and policy gating for one node.
struct Gate<'a> {
    policy: Option<Policy<'a>>,
    depth: usize,
}

impl Gate<'_> {
    fn admits<F: Declared>(&self, field: &F, kind: RuleKind) -> bool {
        let name = field.name();
        if !field.visible_at(self.depth) {
            tracing::trace!(field = name, depth = self.depth, "hidden at this depth");
            return false;
        }
        let Some(policy) = &self.policy else {
            return true;
        };
        let allowed = match kind {
            RuleKind::Attribute => policy.attribute_allowed(name),
            RuleKind::Link => policy.link_allowed(name),
            RuleKind::Embed => policy.embed_allowed(name),
        };
        if !allowed {
            tracing::trace!(field = name, ?kind, "denied by policy");
        }
        allowed
    }
}
