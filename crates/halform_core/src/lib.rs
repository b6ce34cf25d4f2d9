//! Declarations and per-call context for HAL documents.
//!
//! This crate holds everything a resource type declares and everything a
//! resolver sees while a document is assembled. Turning declarations into
//! documents is the job of `halform_serializer`.
//!
//! # Architecture
//!
//! - [`Field`] / [`FieldSet`]: lazily computed values and their ordered,
//!   name-deduplicating collections
//! - [`Link`], [`Curie`], [`Embed`]: the hypermedia field kinds
//! - [`DescriptorBuilder`] / [`Descriptor`]: the declaration of one resource
//!   type, frozen with inherited fields merged in
//! - [`Catalog`]: the descriptor arena, the [`ModelRegistry`] and the
//!   [`HalConfig`]
//! - [`PolicyRules`] / [`Policy`]: per-call field authorization
//! - [`Resource`], [`ResourceCollection`], [`Pageable`]: what serialized
//!   values expose
//! - [`Scope`]: what a resolver sees (subject, options, helpers)

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod field_set;
pub mod link;
pub mod options;
pub mod page;
pub mod policy;
pub mod registry;
pub mod resource;
pub mod scope;

pub use catalog::Catalog;
pub use config::HalConfig;
pub use descriptor::{
    CollectionSpec, Declarations, Descriptor, DescriptorBuilder, DescriptorId, Helper, Namespace,
    PostSerializeHook,
};
pub use error::{BoxError, DeclarationError, HalError};
pub use field::{Attribute, Declared, Field, FieldValue, Resolver, Source};
pub use field_set::FieldSet;
pub use link::{Curie, CurieEntry, Embed, IntoLinkTarget, Link, LinkAttributes, LinkTarget};
pub use options::SerializeOptions;
pub use page::{Page, Pageable};
pub use policy::{Policy, PolicyRules, PolicyScope, Rule, RuleFn, RuleKind};
pub use registry::ModelRegistry;
pub use resource::{Embedded, Resource, ResourceCollection, Subject};
pub use scope::Scope;

/// Re-export of the types needed to declare resources.
pub mod prelude {
    pub use crate::{
        Attribute, BoxError, Catalog, CollectionSpec, Curie, DescriptorBuilder, DescriptorId,
        Embed, Embedded, HalConfig, HalError, Link, LinkTarget, Page, Pageable, PolicyRules,
        Resource, ResourceCollection, RuleKind, Scope, SerializeOptions,
    };
}
