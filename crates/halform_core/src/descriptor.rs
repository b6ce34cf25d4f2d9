//! Resource descriptors.
//!
//! A [`Descriptor`] is the compiled declaration of one resource type: its
//! attributes, links, curies and embeds, plus optional helpers, policy,
//! collection shape and post-serialize hook. Descriptors are built with a
//! [`DescriptorBuilder`] and frozen by [`Catalog::declare`](crate::Catalog::declare),
//! which also merges in everything inherited from the parent.
//!
//! # Example
//!
//! ```
//! use halform_core::{
//!     Attribute, Catalog, CollectionSpec, Curie, DescriptorBuilder, Embed, Link,
//! };
//!
//! let mut catalog = Catalog::new();
//! let comment = catalog
//!     .declare(DescriptorBuilder::new("Comment").attribute(Attribute::property("body")))
//!     .unwrap();
//!
//! let post = catalog
//!     .declare(
//!         DescriptorBuilder::new("Post")
//!             .attribute(Attribute::property("text"))
//!             .link(Link::resolved("self", |scope| {
//!                 Ok(format!("/posts/{}", scope.property("id").unwrap_or_default()))
//!             }))
//!             .curie(Curie::fixed("doc", "/docs/{rel}"))
//!             .embed(Embed::property("comments").with_descriptor(comment))
//!             .collection(CollectionSpec::new("posts").link(Link::fixed("self", "/posts"))),
//!     )
//!     .unwrap();
//!
//! assert_eq!(catalog.get(post).unwrap().name(), "Post");
//! ```

use crate::error::BoxError;
use crate::field::Attribute;
use crate::field_set::FieldSet;
use crate::link::{Curie, Embed, Link};
use crate::policy::PolicyRules;
use crate::resource::Resource;
use crate::scope::Scope;
use core::any::TypeId;
use core::fmt;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Index of a descriptor in its [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(usize);

impl DescriptorId {
    /// Creates an id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named helper resolvers can call through [`Scope::helper`].
pub type Helper = Arc<dyn Fn(&Scope<'_>) -> Result<Value, BoxError> + Send + Sync>;

/// A hook run on the finished tree of every serialized resource.
pub type PostSerializeHook =
    Arc<dyn Fn(&Scope<'_>, &mut Map<String, Value>) -> Result<(), BoxError> + Send + Sync>;

/// Borrowed view of the four field sets of a resource or collection.
#[derive(Debug, Clone, Copy)]
pub struct Declarations<'a> {
    /// Attribute fields.
    pub attributes: &'a FieldSet<Attribute>,
    /// Link fields.
    pub links: &'a FieldSet<Link>,
    /// Curie fields.
    pub curies: &'a FieldSet<Curie>,
    /// Embed fields.
    pub embeds: &'a FieldSet<Embed>,
}

// ─────────────────────────────────────────────────────────────────────────────
// CollectionSpec
// ─────────────────────────────────────────────────────────────────────────────

/// How a descriptor renders a collection of its resources.
///
/// Members are embedded under `_embedded[name]`; the collection-level fields
/// resolve against the collection itself.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    name: String,
    attributes: FieldSet<Attribute>,
    links: FieldSet<Link>,
    curies: FieldSet<Curie>,
    embeds: FieldSet<Embed>,
}

impl CollectionSpec {
    /// Creates a spec embedding members under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: FieldSet::new(),
            links: FieldSet::new(),
            curies: FieldSet::new(),
            embeds: FieldSet::new(),
        }
    }

    /// Declares a collection-level attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.declare(attribute);
        self
    }

    /// Declares a collection-level link, replacing any with the same rel.
    #[must_use]
    pub fn link(mut self, link: Link) -> Self {
        self.links.declare(link);
        self
    }

    /// Adds a collection-level link alongside any with the same rel.
    #[must_use]
    pub fn additional_link(mut self, link: Link) -> Self {
        self.links.append(link);
        self
    }

    /// Declares a collection-level curie.
    #[must_use]
    pub fn curie(mut self, curie: Curie) -> Self {
        self.curies.declare(curie);
        self
    }

    /// Declares a collection-level embed.
    #[must_use]
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.declare(embed);
        self
    }

    /// Returns the member embed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection-level fields.
    #[must_use]
    pub fn declarations(&self) -> Declarations<'_> {
        Declarations {
            attributes: &self.attributes,
            links: &self.links,
            curies: &self.curies,
            embeds: &self.embeds,
        }
    }

    pub(crate) fn rebind_all(&mut self, context: DescriptorId) {
        self.attributes.rebind_all(context);
        self.links.rebind_all(context);
        self.curies.rebind_all(context);
        self.embeds.rebind_all(context);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Namespace
// ─────────────────────────────────────────────────────────────────────────────

/// Links and embeds declared under a curie prefix.
///
/// Built by [`DescriptorBuilder::namespace`].
#[derive(Debug)]
pub struct Namespace {
    prefix: String,
    links: Vec<Link>,
    embeds: Vec<Embed>,
}

impl Namespace {
    /// Declares a link whose rel gets the namespace prefix.
    #[must_use]
    pub fn link(mut self, mut link: Link) -> Self {
        link.qualify(&self.prefix);
        self.links.push(link);
        self
    }

    /// Declares an embed whose name gets the namespace prefix.
    #[must_use]
    pub fn embed(mut self, mut embed: Embed) -> Self {
        embed.qualify(&self.prefix);
        self.embeds.push(embed);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DescriptorBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects the declarations of one descriptor.
///
/// Declaring a name again replaces the earlier declaration, both within the
/// builder and against anything inherited from the parent.
pub struct DescriptorBuilder {
    pub(crate) name: String,
    pub(crate) parent: Option<DescriptorId>,
    pub(crate) models: Vec<(TypeId, &'static str)>,
    pub(crate) attributes: FieldSet<Attribute>,
    pub(crate) links: FieldSet<Link>,
    pub(crate) curies: FieldSet<Curie>,
    pub(crate) embeds: FieldSet<Embed>,
    pub(crate) helpers: IndexMap<String, Helper>,
    pub(crate) collection: Option<CollectionSpec>,
    pub(crate) policy: Option<Arc<PolicyRules>>,
    pub(crate) post_serialize: Option<PostSerializeHook>,
}

impl DescriptorBuilder {
    /// Starts a descriptor with a name used in diagnostics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            models: Vec::new(),
            attributes: FieldSet::new(),
            links: FieldSet::new(),
            curies: FieldSet::new(),
            embeds: FieldSet::new(),
            helpers: IndexMap::new(),
            collection: None,
            policy: None,
            post_serialize: None,
        }
    }

    /// Inherits every declaration of `parent`.
    #[must_use]
    pub fn extends(mut self, parent: DescriptorId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Registers this descriptor for model type `M`.
    #[must_use]
    pub fn model<M: Resource>(mut self) -> Self {
        self.models
            .push((TypeId::of::<M>(), core::any::type_name::<M>()));
        self
    }

    /// Declares an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.declare(attribute);
        self
    }

    /// Declares a link, replacing any with the same rel.
    #[must_use]
    pub fn link(mut self, link: Link) -> Self {
        self.links.declare(link);
        self
    }

    /// Adds a link alongside any with the same rel; they render as an array.
    #[must_use]
    pub fn additional_link(mut self, link: Link) -> Self {
        self.links.append(link);
        self
    }

    /// Declares a curie.
    #[must_use]
    pub fn curie(mut self, curie: Curie) -> Self {
        self.curies.declare(curie);
        self
    }

    /// Declares an embed.
    #[must_use]
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.declare(embed);
        self
    }

    /// Declares links and embeds under the curie prefix `curie`.
    ///
    /// ```
    /// use halform_core::{Curie, DescriptorBuilder, Link};
    ///
    /// let builder = DescriptorBuilder::new("Post")
    ///     .namespace("doc", |ns| ns.link(Link::fixed("author", "/authors/1")))
    ///     .curie(Curie::fixed("doc", "/docs/{rel}"));
    /// # let _ = builder;
    /// ```
    #[must_use]
    pub fn namespace(
        mut self,
        curie: impl Into<String>,
        declare: impl FnOnce(Namespace) -> Namespace,
    ) -> Self {
        let namespace = declare(Namespace {
            prefix: curie.into(),
            links: Vec::new(),
            embeds: Vec::new(),
        });
        for link in namespace.links {
            self.links.declare(link);
        }
        for embed in namespace.embeds {
            self.embeds.declare(embed);
        }
        self
    }

    /// Declares a named helper for resolvers of this descriptor and its subtypes.
    #[must_use]
    pub fn helper<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }

    /// Declares how collections of this resource are rendered.
    #[must_use]
    pub fn collection(mut self, collection: CollectionSpec) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Attaches a policy deciding field visibility per call.
    #[must_use]
    pub fn policy(mut self, rules: impl Into<Arc<PolicyRules>>) -> Self {
        self.policy = Some(rules.into());
        self
    }

    /// Attaches a hook that may mutate each serialized tree.
    #[must_use]
    pub fn post_serialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Scope<'_>, &mut Map<String, Value>) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.post_serialize = Some(Arc::new(hook));
        self
    }

    /// Returns the descriptor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for DescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("attributes", &self.attributes)
            .field("links", &self.links)
            .field("curies", &self.curies)
            .field("embeds", &self.embeds)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// A frozen resource declaration, with inherited fields already merged in.
pub struct Descriptor {
    pub(crate) id: DescriptorId,
    pub(crate) name: String,
    pub(crate) parent: Option<DescriptorId>,
    pub(crate) attributes: FieldSet<Attribute>,
    pub(crate) links: FieldSet<Link>,
    pub(crate) curies: FieldSet<Curie>,
    pub(crate) embeds: FieldSet<Embed>,
    pub(crate) helpers: IndexMap<String, Helper>,
    pub(crate) collection: Option<CollectionSpec>,
    pub(crate) policy: Option<Arc<PolicyRules>>,
    pub(crate) post_serialize: Option<PostSerializeHook>,
}

impl Descriptor {
    /// Returns the id within the catalog.
    #[must_use]
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent descriptor, if this one extends another.
    #[must_use]
    pub fn parent(&self) -> Option<DescriptorId> {
        self.parent
    }

    /// Returns the attribute fields.
    #[must_use]
    pub fn attributes(&self) -> &FieldSet<Attribute> {
        &self.attributes
    }

    /// Returns the link fields.
    #[must_use]
    pub fn links(&self) -> &FieldSet<Link> {
        &self.links
    }

    /// Returns the curie fields.
    #[must_use]
    pub fn curies(&self) -> &FieldSet<Curie> {
        &self.curies
    }

    /// Returns the embed fields.
    #[must_use]
    pub fn embeds(&self) -> &FieldSet<Embed> {
        &self.embeds
    }

    /// Returns all four field sets.
    #[must_use]
    pub fn declarations(&self) -> Declarations<'_> {
        Declarations {
            attributes: &self.attributes,
            links: &self.links,
            curies: &self.curies,
            embeds: &self.embeds,
        }
    }

    /// Returns a helper by name.
    #[must_use]
    pub fn helper(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    /// Returns the collection spec, if collections can be rendered.
    #[must_use]
    pub fn collection(&self) -> Option<&CollectionSpec> {
        self.collection.as_ref()
    }

    /// Returns the policy rules, if any.
    #[must_use]
    pub fn policy(&self) -> Option<&PolicyRules> {
        self.policy.as_deref()
    }

    /// Returns the post-serialize hook, if any.
    #[must_use]
    pub fn post_serialize(&self) -> Option<&PostSerializeHook> {
        self.post_serialize.as_ref()
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("attributes", &self.attributes)
            .field("links", &self.links)
            .field("curies", &self.curies)
            .field("embeds", &self.embeds)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("collection", &self.collection.as_ref().map(CollectionSpec::name))
            .field("policy", &self.policy.is_some())
            .field("post_serialize", &self.post_serialize.is_some())
            .finish()
    }
}
