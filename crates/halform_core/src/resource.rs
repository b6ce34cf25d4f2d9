//! Resources, collections and embedded values.
//!
//! A [`Resource`] is anything a descriptor can be applied to. The engine only
//! needs three things from it:
//!
//! - [`Resource::property`] - the fallback for attributes without a value or resolver
//! - [`Resource::relation`] - the fallback for embeds without a value or resolver
//! - its runtime type, for descriptor lookup in the [`Catalog`](crate::Catalog)
//!
//! Resolvers get at the concrete type with
//! [`Scope::resource_as`](crate::Scope::resource_as).
//!
//! # Example
//!
//! ```
//! use halform_core::Resource;
//! use serde_json::Value;
//!
//! struct Post {
//!     id: u64,
//!     text: String,
//! }
//!
//! impl Resource for Post {
//!     fn property(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "id" => Some(self.id.into()),
//!             "text" => Some(self.text.clone().into()),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use crate::page::Pageable;
use core::any::{Any, TypeId};
use core::fmt;
use serde_json::Value;
use std::sync::Arc;

/// A domain object that can be presented as a HAL document.
pub trait Resource: Any + Send + Sync {
    /// Returns the value of a named property, if the resource has one.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Returns the related resource(s) behind a name, if any.
    fn relation(&self, name: &str) -> Option<Embedded> {
        let _ = name;
        None
    }

    /// Model types this resource should also be looked up as, nearest first.
    ///
    /// Stands in for a supertype chain: when no descriptor is registered for
    /// the concrete type, each of these is tried in order.
    fn supertypes(&self) -> Vec<TypeId> {
        Vec::new()
    }

    /// Identity used in diagnostics.
    fn identity(&self) -> String {
        core::any::type_name::<Self>().to_owned()
    }
}

impl dyn Resource {
    /// Returns the [`TypeId`] of the concrete resource type.
    #[must_use]
    pub fn model_type(&self) -> TypeId {
        let any: &dyn Any = self;
        any.type_id()
    }

    /// Returns the lookup chain: the concrete type followed by [`Resource::supertypes`].
    #[must_use]
    pub fn model_chain(&self) -> Vec<TypeId> {
        let mut chain = vec![self.model_type()];
        chain.extend(self.supertypes());
        chain
    }

    /// Downcasts to a concrete resource type.
    #[must_use]
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resource").field(&self.identity()).finish()
    }
}

/// Ad-hoc records: object keys are properties, nested objects and arrays are relations.
impl Resource for Value {
    fn property(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn relation(&self, name: &str) -> Option<Embedded> {
        match self.get(name)? {
            Value::Null => Some(Embedded::None),
            Value::Array(items) => Some(Embedded::many(items.iter().cloned().map(Arc::new))),
            other => Some(Embedded::one(Arc::new(other.clone()))),
        }
    }

    fn identity(&self) -> String {
        match self.get("id") {
            Some(id) => format!("json record {id}"),
            None => "json record".to_owned(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedded
// ─────────────────────────────────────────────────────────────────────────────

/// The value of an embed: nothing, one resource, or a homogeneous sequence.
#[derive(Clone, Default)]
pub enum Embedded {
    /// Nothing to embed; the embed is left out of the document.
    #[default]
    None,
    /// A single resource, embedded as one object.
    One(Arc<dyn Resource>),
    /// A sequence of resources, embedded as an array.
    Many(Vec<Arc<dyn Resource>>),
}

impl Embedded {
    /// Embeds a single resource.
    #[must_use]
    pub fn one(resource: Arc<dyn Resource>) -> Self {
        Self::One(resource)
    }

    /// Embeds a sequence of resources of the same type.
    pub fn many<R, I>(resources: I) -> Self
    where
        R: Resource,
        I: IntoIterator<Item = Arc<R>>,
    {
        Self::Many(
            resources
                .into_iter()
                .map(|resource| resource as Arc<dyn Resource>)
                .collect(),
        )
    }

    /// Returns whether there is nothing to embed.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Arc<dyn Resource>> for Embedded {
    fn from(resource: Arc<dyn Resource>) -> Self {
        Self::One(resource)
    }
}

impl From<Vec<Arc<dyn Resource>>> for Embedded {
    fn from(resources: Vec<Arc<dyn Resource>>) -> Self {
        Self::Many(resources)
    }
}

impl<T: Into<Embedded>> From<Option<T>> for Embedded {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

impl fmt::Debug for Embedded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::One(resource) => f.debug_tuple("One").field(&resource.identity()).finish(),
            Self::Many(resources) => f
                .debug_tuple("Many")
                .field(&resources.iter().map(|r| r.identity()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceCollection
// ─────────────────────────────────────────────────────────────────────────────

/// A collection of resources serialized with a descriptor's collection spec.
///
/// Collection-level fields resolve against the collection itself, so it has
/// its own property and relation fallbacks.
pub trait ResourceCollection: Send + Sync {
    /// The member resources, in document order.
    fn members(&self) -> Vec<Arc<dyn Resource>>;

    /// Returns the value of a named collection-level property.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Returns the related resource(s) behind a collection-level name.
    fn relation(&self, name: &str) -> Option<Embedded> {
        let _ = name;
        None
    }

    /// Returns the pagination capability, if the collection is paged.
    fn pageable(&self) -> Option<&dyn Pageable> {
        None
    }

    /// Identity used in diagnostics.
    fn identity(&self) -> String {
        core::any::type_name::<Self>().to_owned()
    }
}

impl ResourceCollection for Vec<Arc<dyn Resource>> {
    fn members(&self) -> Vec<Arc<dyn Resource>> {
        self.clone()
    }

    fn identity(&self) -> String {
        format!("collection of {}", self.len())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subject
// ─────────────────────────────────────────────────────────────────────────────

/// What a field is being resolved against.
#[derive(Clone, Copy)]
pub enum Subject<'a> {
    /// A single resource.
    Resource(&'a dyn Resource),
    /// A collection, for collection-level fields.
    Collection(&'a dyn ResourceCollection),
}

impl<'a> Subject<'a> {
    /// Returns the resource, if this is a single resource.
    #[must_use]
    pub fn resource(self) -> Option<&'a dyn Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            Self::Collection(_) => None,
        }
    }

    /// Returns the collection, if this is a collection.
    #[must_use]
    pub fn collection(self) -> Option<&'a dyn ResourceCollection> {
        match self {
            Self::Resource(_) => None,
            Self::Collection(collection) => Some(collection),
        }
    }

    /// Reads a named property.
    #[must_use]
    pub fn property(self, name: &str) -> Option<Value> {
        match self {
            Self::Resource(resource) => resource.property(name),
            Self::Collection(collection) => collection.property(name),
        }
    }

    /// Reads a named relation.
    #[must_use]
    pub fn relation(self, name: &str) -> Option<Embedded> {
        match self {
            Self::Resource(resource) => resource.relation(name),
            Self::Collection(collection) => collection.relation(name),
        }
    }

    /// Identity used in diagnostics.
    #[must_use]
    pub fn identity(self) -> String {
        match self {
            Self::Resource(resource) => resource.identity(),
            Self::Collection(collection) => collection.identity(),
        }
    }
}

impl fmt::Debug for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(_) => f.debug_tuple("Resource").field(&self.identity()).finish(),
            Self::Collection(_) => f.debug_tuple("Collection").field(&self.identity()).finish(),
        }
    }
}
